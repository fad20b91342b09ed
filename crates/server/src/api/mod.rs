pub mod health;
pub mod openapi;
pub mod schemas;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cairn_uploads::UploadService;

use crate::auth::CredentialChecker;
use crate::auth::middleware::AuthLayer;
use crate::config::UploadsConfig;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The upload service.
    pub uploads: Arc<UploadService>,
    /// Optional credential checker (None when auth is disabled).
    pub auth: Option<Arc<dyn CredentialChecker>>,
    /// Upload endpoint settings.
    pub config: Arc<UploadsConfig>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let mut public = Router::new()
        .route("/health", get(health::health))
        .route("/uploads/{upload_id}", get(uploads::get_upload));

    let mut protected = Router::new()
        .route("/uploads", post(uploads::create_upload))
        .route("/uploads/{upload_id}", delete(uploads::delete_upload));

    if state.config.list_requires_auth {
        protected = protected.route("/uploads", get(uploads::list_uploads));
    } else {
        public = public.route("/uploads", get(uploads::list_uploads));
    }

    let protected = protected.layer(AuthLayer::new(state.auth.clone()));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
