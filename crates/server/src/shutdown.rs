//! Process shutdown coordination.
//!
//! One task listens for SIGINT/SIGTERM and flips a [`Shutdown`]; any number
//! of waiters (the graceful-shutdown hook, the drain deadline) observe the
//! same flip.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// A one-way latch that many futures can wait on.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trip the latch. Later calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once [`trigger`](Self::trigger) has been called, including
    /// when it was called before this future was created.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // The sender lives as long as any `Shutdown` clone; an error
            // means all of them are gone and nothing can trigger any more.
            let observed = rx.wait_for(|triggered| *triggered).await.is_ok();
            if !observed {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Spawn the task that trips the latch on SIGINT or SIGTERM.
    pub fn listen_for_signals(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            os_signal().await;
            shutdown.trigger();
        });
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn one_trigger_releases_every_waiter() {
        let shutdown = Shutdown::new();
        let graceful = tokio::spawn(shutdown.wait());
        let deadline = tokio::spawn(shutdown.wait());

        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            graceful.await.unwrap();
            deadline.await.unwrap();
        })
        .await
        .expect("both waiters should resolve");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn waiter_created_after_trigger_resolves() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("late waiter should resolve immediately");
    }

    #[tokio::test]
    async fn untriggered_waiter_stays_pending() {
        let shutdown = Shutdown::new();
        let result = tokio::time::timeout(Duration::from_millis(50), shutdown.wait()).await;
        assert!(result.is_err());
        assert!(!shutdown.is_triggered());
    }
}
