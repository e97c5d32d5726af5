use serde::Serialize;
use thiserror::Error;

/// Metadata about the uploaded payload, echoed back in conversion-failure
/// responses to help callers debug bad inputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadInfo {
    #[serde(rename = "originalName")]
    pub original_name: Option<String>,
    pub mimetype: Option<String>,
    pub size: usize,
}

/// Main error type for the conversion service
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("ffmpeg exited with {exit}")]
    ConversionFailed {
        /// Exit status description of the external process.
        exit: String,
        /// Captured (bounded) stderr/stdout of the external process.
        details: String,
        /// What the client told us about the upload.
        input: UploadInfo,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConvertError = io.into();
        assert!(matches!(err, ConvertError::Io(_)));
    }

    #[test]
    fn test_upload_info_serializes_camel_case() {
        let info = UploadInfo {
            original_name: Some("song.wav".to_string()),
            mimetype: Some("audio/wav".to_string()),
            size: 42,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["originalName"], "song.wav");
        assert_eq!(json["mimetype"], "audio/wav");
        assert_eq!(json["size"], 42);
    }
}
