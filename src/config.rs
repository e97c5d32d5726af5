//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    /// Binary name or path of the external transcoder
    pub binary: String,

    /// Maximum bytes of captured stdout/stderr kept for diagnostics
    pub capture_limit_bytes: usize,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            capture_limit_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Conversion defaults and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Scratch directory for per-request temp files
    pub scratch_dir: PathBuf,

    /// Default output format when the client does not specify one
    pub default_format: String,

    /// Default bitrate when the client does not specify one
    pub default_bitrate: String,

    /// Maximum upload size in MiB (multipart and JSON bodies)
    pub max_upload_mib: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            default_format: "ogg".to_string(),
            default_bitrate: "128k".to_string(),
            max_upload_mib: 500,
        }
    }
}

impl ConvertConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mib * 1024 * 1024
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// External tool configuration
    pub ffmpeg: FfmpegConfig,

    /// Conversion configuration
    pub convert: ConvertConfig,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ffmpeg: FfmpegConfig::default(),
            convert: ConvertConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides (`PORT`)
    pub fn apply_env(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!("Ignoring unparseable PORT value: {}", port),
            }
        }
        self
    }
}
