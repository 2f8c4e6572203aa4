use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, ProviderStatus};

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/trends", get(handlers::get_trends))
        .route("/api/extract", post(handlers::extract_article))
        .route("/api/ideas", post(handlers::generate_ideas))
        .route("/api/script", post(handlers::generate_script))
        .route("/api/audio", post(handlers::generate_audio))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState, ProviderStatus};
    pub use ts_core::{Error, Result};
}
