//! Output format selection and input extension heuristics
//!
//! Static, process-wide tables:
//! - target format -> ffmpeg encoder + response content type
//! - declared MIME type -> input file extension
//!
//! The input-extension resolver is best-effort by design: when neither the
//! filename nor the MIME type yields an extension, ffmpeg probes the input
//! by content.

use crate::error::ConvertError;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ogg,
    Mp3,
    Opus,
    M4a,
    Aac,
}

impl OutputFormat {
    /// Parse a client-supplied format string
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.to_ascii_lowercase().as_str() {
            "ogg" => Ok(Self::Ogg),
            "mp3" => Ok(Self::Mp3),
            "opus" => Ok(Self::Opus),
            "m4a" => Ok(Self::M4a),
            "aac" => Ok(Self::Aac),
            other => Err(ConvertError::InvalidFormat(other.to_string())),
        }
    }

    /// File extension used for the temp output path
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::M4a => "m4a",
            Self::Aac => "aac",
        }
    }

    /// ffmpeg encoder name (`-c:a` argument)
    ///
    /// m4a and aac intentionally share the native aac encoder.
    pub fn encoder(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Ogg => "libvorbis",
            Self::Opus => "libopus",
            Self::M4a | Self::Aac => "aac",
        }
    }

    /// MIME type for the response Content-Type header
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::M4a => "audio/mp4",
            Self::Aac => "audio/aac",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Map a declared input MIME type to a file extension.
///
/// Returns `None` for unrecognized types; the caller then writes the temp
/// input without a suffix and lets ffmpeg detect the container by content.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "audio/mpeg" => Some("mp3"),
        "audio/wav" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        "audio/flac" => Some("flac"),
        "audio/aac" => Some("aac"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/webm" | "video/webm" => Some("webm"),
        _ => None,
    }
}

/// Resolve the input file extension from the declared filename, falling back
/// to the declared MIME type. Never fails; an empty result means "unknown".
pub fn resolve_input_extension(filename: Option<&str>, mime: Option<&str>) -> String {
    if let Some(name) = filename {
        if let Some((_, ext)) = name.rsplit_once('.') {
            if !ext.is_empty() {
                return ext.to_ascii_lowercase();
            }
        }
    }
    mime.and_then(extension_for_mime).unwrap_or("").to_string()
}
