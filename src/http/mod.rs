//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the conversion endpoints
//! - Multipart and base64 upload ingestion
//! - Error-to-status translation with JSON bodies
//! - CORS middleware

pub mod handlers;
pub mod routes;

pub use routes::create_router;
