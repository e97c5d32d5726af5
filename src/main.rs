//! Audio Conversion Server
//!
//! A small HTTP service that buffers an uploaded audio payload, shells out
//! to ffmpeg for format/bitrate conversion, and returns the result as
//! binary audio or a base64 JSON envelope. All codec work is delegated to
//! the external tool; this process only manages the request pipeline
//! around it: scratch files, the subprocess, and cleanup.

mod config;
mod error;
mod format;
mod http;
mod scratch;
mod state;
mod transcode;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "audio-convert-server";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        match ServerConfig::from_file(&config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    config_path,
                    e
                );
                ServerConfig::default()
            }
        }
    } else {
        ServerConfig::default()
    };
    let config = config.apply_env();
    tracing::info!("Configuration loaded: {:?}", config);

    // Create application state
    let state = Arc::new(AppState::new(config.clone()));

    // Probe the external tool once; the service runs either way and the
    // health endpoint stays static.
    if state.transcoder.probe().await {
        tracing::info!("ffmpeg probe succeeded ({})", config.ffmpeg.binary);
    } else {
        tracing::warn!(
            "ffmpeg probe failed ({}); conversions will error until it is available",
            config.ffmpeg.binary
        );
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audio_convert_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
