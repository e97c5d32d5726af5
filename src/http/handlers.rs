//! HTTP request handlers
//!
//! Implements the conversion endpoints. Each request runs the same pipeline:
//! ingest the upload, resolve formats, allocate a scratch pair, invoke the
//! external transcoder, emit the response. Scratch cleanup runs after the
//! outcome is decided, on success and on failure alike.

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ConvertError, UploadInfo};
use crate::format::{resolve_input_extension, OutputFormat};
use crate::scratch::ScratchPair;
use crate::state::AppState;

/// Fixed client-facing message for an unsupported format
const INVALID_FORMAT_MSG: &str = "Invalid format. Supported: ogg, mp3, opus, m4a, aac";

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    ConversionFailed { details: String, input: UploadInfo },
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            HttpError::ConversionFailed { details, input } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Conversion failed",
                    "details": details,
                    "input": input,
                })),
            )
                .into_response(),
            HttpError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}

impl From<ConvertError> for HttpError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::MissingInput(msg) => HttpError::BadRequest(msg.to_string()),
            ConvertError::InvalidFormat(_) => HttpError::BadRequest(INVALID_FORMAT_MSG.to_string()),
            ConvertError::BadRequest(msg) => HttpError::BadRequest(msg),
            ConvertError::ConversionFailed { details, input, .. } => {
                HttpError::ConversionFailed { details, input }
            }
            ConvertError::Io(e) => HttpError::InternalError(format!("IO error: {}", e)),
        }
    }
}

/// Query parameters for the binary conversion endpoint
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub format: Option<String>,
    pub bitrate: Option<String>,
}

/// JSON body for the base64 conversion endpoint
#[derive(Debug, Deserialize)]
pub struct ConvertBase64Request {
    pub audio: Option<String>,
    pub format: Option<String>,
    pub bitrate: Option<String>,
}

/// JSON response of the base64 conversion endpoint
#[derive(Debug, Serialize)]
pub struct ConvertBase64Response {
    pub audio: String,
    pub format: String,
    pub size: usize,
}

/// Health check endpoint
/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    // Static by contract; the real ffmpeg probe runs once at startup.
    Json(serde_json::json!({ "status": "ok", "ffmpeg": true }))
}

/// Version endpoint
/// GET /version
pub async fn version_check() -> &'static str {
    concat!("audio-convert-server v", env!("CARGO_PKG_VERSION"))
}

/// A buffered multipart upload
struct UploadedAudio {
    data: Bytes,
    filename: Option<String>,
    mimetype: Option<String>,
}

/// Pull the `audio` field out of a multipart body, keeping the declared
/// filename and MIME type. Returns `None` when no such field is present.
async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<UploadedAudio>, HttpError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(format!("Failed reading multipart field: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let mimetype = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| {
            HttpError::BadRequest(format!("Failed reading multipart 'audio' field: {}", e))
        })?;
        return Ok(Some(UploadedAudio {
            data,
            filename,
            mimetype,
        }));
    }
    Ok(None)
}

/// Run one conversion through the scratch pair, always cleaning up.
async fn run_conversion(
    state: &AppState,
    data: &[u8],
    input_ext: &str,
    format: OutputFormat,
    bitrate: &str,
    upload: &UploadInfo,
) -> Result<Bytes, HttpError> {
    let pair = ScratchPair::new(&state.config.convert.scratch_dir, input_ext, format);
    let result = state
        .transcoder
        .convert(&pair, data, format, bitrate, upload)
        .await;
    // Exactly once per request, whatever the outcome.
    pair.cleanup();
    Ok(result?)
}

/// Binary conversion endpoint
/// POST /convert?format=<fmt>&bitrate=<br> with multipart field `audio`
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
    mut multipart: Multipart,
) -> Result<Response, HttpError> {
    let format = parse_format(&state, query.format.as_deref())?;
    let bitrate = query
        .bitrate
        .unwrap_or_else(|| state.config.convert.default_bitrate.clone());

    let upload = read_audio_field(&mut multipart)
        .await?
        .ok_or(ConvertError::MissingInput("No audio file provided"))?;

    let info = UploadInfo {
        original_name: upload.filename.clone(),
        mimetype: upload.mimetype.clone(),
        size: upload.data.len(),
    };
    tracing::info!(
        format = %format,
        bitrate = %bitrate,
        size = info.size,
        filename = info.original_name.as_deref().unwrap_or("-"),
        "Convert request"
    );

    let input_ext = resolve_input_extension(upload.filename.as_deref(), upload.mimetype.as_deref());
    let audio = run_conversion(&state, &upload.data, &input_ext, format, &bitrate, &info).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    Ok((headers, audio).into_response())
}

/// Base64 conversion endpoint
/// POST /convert-base64 with JSON body `{audio, format?, bitrate?}`
pub async fn convert_base64(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConvertBase64Request>,
) -> Result<Json<ConvertBase64Response>, HttpError> {
    let format = parse_format(&state, req.format.as_deref())?;
    let bitrate = req
        .bitrate
        .unwrap_or_else(|| state.config.convert.default_bitrate.clone());

    let audio_b64 = req
        .audio
        .filter(|s| !s.is_empty())
        .ok_or(ConvertError::MissingInput("No audio data provided"))?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(&audio_b64)
        .map_err(|_| ConvertError::BadRequest("Invalid base64 audio data".to_string()))?;

    let info = UploadInfo {
        original_name: None,
        mimetype: None,
        size: data.len(),
    };
    tracing::info!(format = %format, bitrate = %bitrate, size = info.size, "Convert-base64 request");

    // No filename or MIME type in this mode; ffmpeg probes the input.
    let audio = run_conversion(&state, &data, "", format, &bitrate, &info).await?;

    Ok(Json(ConvertBase64Response {
        audio: base64::engine::general_purpose::STANDARD.encode(&audio),
        format: format.to_string(),
        size: audio.len(),
    }))
}

fn parse_format(state: &AppState, requested: Option<&str>) -> Result<OutputFormat, HttpError> {
    let name = requested.unwrap_or(&state.config.convert.default_format);
    Ok(OutputFormat::parse(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn test_invalid_format_maps_to_fixed_message() {
        let err: HttpError = ConvertError::InvalidFormat("wav".to_string()).into();
        match err {
            HttpError::BadRequest(msg) => assert_eq!(msg, INVALID_FORMAT_MSG),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_conversion_failed_keeps_details() {
        let err: HttpError = ConvertError::ConversionFailed {
            exit: "exit status: 1".to_string(),
            details: "unknown codec".to_string(),
            input: UploadInfo {
                original_name: Some("a.wav".to_string()),
                mimetype: None,
                size: 3,
            },
        }
        .into();
        match err {
            HttpError::ConversionFailed { details, input } => {
                assert_eq!(details, "unknown codec");
                assert_eq!(input.original_name.as_deref(), Some("a.wav"));
            }
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_parse_format_uses_config_default() {
        let state = AppState::new(ServerConfig::default());
        let format = parse_format(&state, None).unwrap();
        assert_eq!(format, OutputFormat::Ogg);

        let format = parse_format(&state, Some("mp3")).unwrap();
        assert_eq!(format, OutputFormat::Mp3);

        assert!(parse_format(&state, Some("wav")).is_err());
    }
}
