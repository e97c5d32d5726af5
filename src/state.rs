//! Application state
//!
//! Shared, read-only per-process state: the configuration and the external
//! transcoder handle. No mutable state crosses requests; every conversion
//! is self-contained around its own scratch pair.

use crate::config::ServerConfig;
use crate::transcode::Transcoder;

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// External transcoder runner
    pub transcoder: Transcoder,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self {
            transcoder: Transcoder::new(config.ffmpeg.clone()),
            config,
        }
    }

    /// Create AppState with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_defaults()
    }
}
