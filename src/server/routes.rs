//! Router configuration for the web form.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::pdf::FILE_NAME;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/generate", post(handlers::generate_notice))
        .route(&format!("/{}", FILE_NAME), get(handlers::download_notice))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
