use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use cairn_server::api::AppState;
use cairn_server::auth::{BasicCredentialChecker, CredentialChecker};
use cairn_server::config::{CairnConfig, PASSWORD_ENV, USERNAME_ENV};
use cairn_server::shutdown::Shutdown;
use cairn_server::store_factory;
use cairn_uploads::UploadServiceBuilder;

/// Cairn content-addressed upload server.
#[derive(Parser, Debug)]
#[command(name = "cairn-server", about = "Standalone HTTP server for Cairn")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "cairn.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config: CairnConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    config
        .auth
        .apply_overrides(std::env::var(USERNAME_ENV).ok(), std::env::var(PASSWORD_ENV).ok());

    let deriver = store_factory::create_deriver(&config.ids);
    let metadata = store_factory::create_metadata_store(&config.metadata).await?;
    let blobs = store_factory::create_blob_store(&config.blob).await?;
    info!(
        ids = ?config.ids.strategy,
        metadata = %config.metadata.backend,
        blob = %config.blob.backend,
        "stores initialized"
    );

    let uploads = UploadServiceBuilder::new()
        .deriver(deriver)
        .metadata(metadata)
        .blobs(blobs)
        .build()?;

    let auth = BasicCredentialChecker::from_config(&config.auth)?
        .map(|checker| Arc::new(checker) as Arc<dyn CredentialChecker>);
    if auth.is_some() {
        info!("basic auth enabled");
    } else {
        warn!("auth disabled, protected routes are open");
    }

    let state = AppState {
        uploads: Arc::new(uploads),
        auth,
        config: Arc::new(config.uploads.clone()),
    };
    let app = cairn_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "cairn-server listening");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .into_future();

    // Bound the drain of in-flight requests once a signal arrives.
    tokio::select! {
        result = server => result?,
        () = drain_deadline(&shutdown, shutdown_timeout) => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping in-flight requests"
            );
        }
    }

    info!("cairn-server shut down");
    Ok(())
}

/// Resolve `timeout` after shutdown has been triggered.
async fn drain_deadline(shutdown: &Shutdown, timeout: Duration) {
    shutdown.wait().await;
    tokio::time::sleep(timeout).await;
}
