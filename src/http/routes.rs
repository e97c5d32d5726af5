//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{convert, convert_base64, health_check, version_check};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Build CORS layer. Browser upload forms need both preflight and
    // content-type negotiation to pass.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .max_age(Duration::from_secs(3600));

    // Uploads are buffered whole; the body limit is the only admission
    // control in front of the transcoder.
    let body_limit = state.config.convert.max_upload_bytes();

    Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Conversion endpoints
        .route("/convert", post(convert))
        .route("/convert-base64", post(convert_base64))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
