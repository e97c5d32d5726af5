//! External transcoder invocation
//!
//! The service performs no transcoding itself: the input buffer is written
//! to the scratch input path, ffmpeg is invoked as
//! `-i <input> -c:a <encoder> -b:a <bitrate> -y <output>`, and the output
//! file is read back whole. The subprocess wait is the single blocking step
//! of the pipeline; it is awaited through `tokio::process` so the handler
//! task yields while ffmpeg runs. There is no timeout and no cancellation.

use bytes::Bytes;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::FfmpegConfig;
use crate::error::{ConvertError, Result, UploadInfo};
use crate::format::OutputFormat;
use crate::scratch::ScratchPair;

/// Runs the external transcoder for one request at a time.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: FfmpegConfig,
}

impl Transcoder {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Check whether the external tool is runnable (`ffmpeg -version`).
    ///
    /// Used once at startup for a log line; the service starts either way.
    pub async fn probe(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Convert `data` to `format` at `bitrate`, using the paths in `pair`.
    ///
    /// Writes the input file, blocks on the subprocess, reads the output
    /// file. Does NOT clean up the scratch pair; the caller owns cleanup so
    /// it runs on every exit path including errors raised here.
    pub async fn convert(
        &self,
        pair: &ScratchPair,
        data: &[u8],
        format: OutputFormat,
        bitrate: &str,
        upload: &UploadInfo,
    ) -> Result<Bytes> {
        tokio::fs::write(&pair.input_path, data).await?;

        tracing::debug!(
            id = %pair.id,
            format = %format,
            bitrate = %bitrate,
            input_bytes = data.len(),
            "Starting conversion"
        );

        let output = Command::new(&self.config.binary)
            .arg("-i")
            .arg(&pair.input_path)
            // Keep the capture to actual diagnostics
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-c:a")
            .arg(format.encoder())
            .arg("-b:a")
            .arg(bitrate)
            .arg("-y")
            .arg(&pair.output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let details = bounded_capture(&output.stderr, &output.stdout, self.config.capture_limit_bytes);
            tracing::warn!(
                id = %pair.id,
                status = %output.status,
                "Conversion failed: {}",
                details.lines().next().unwrap_or("")
            );
            return Err(ConvertError::ConversionFailed {
                exit: output.status.to_string(),
                details,
                input: upload.clone(),
            });
        }

        // The tool can report success without producing a file; surface that
        // as an IO failure rather than an empty 200.
        let bytes = tokio::fs::read(&pair.output_path).await?;
        tracing::debug!(id = %pair.id, output_bytes = bytes.len(), "Conversion complete");
        Ok(Bytes::from(bytes))
    }
}

/// Join stderr and stdout into one diagnostic string, truncated to `limit`
/// bytes. Stderr comes first; that is where ffmpeg writes its errors.
fn bounded_capture(stderr: &[u8], stdout: &[u8], limit: usize) -> String {
    let mut combined = Vec::with_capacity(stderr.len().min(limit));
    for chunk in [stderr, stdout] {
        if combined.len() >= limit {
            break;
        }
        let room = limit - combined.len();
        combined.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    String::from_utf8_lossy(&combined).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn transcoder_with_binary(binary: &str) -> Transcoder {
        Transcoder::new(FfmpegConfig {
            binary: binary.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_bounded_capture_truncates() {
        let stderr = vec![b'e'; 10];
        let stdout = vec![b'o'; 10];
        let capture = bounded_capture(&stderr, &stdout, 12);
        assert_eq!(capture.len(), 12);
        assert!(capture.starts_with("eeeeeeeeee"));
        assert!(capture.ends_with("oo"));
    }

    #[test]
    fn test_bounded_capture_keeps_short_output() {
        let capture = bounded_capture(b"bad input", b"", 1024);
        assert_eq!(capture, "bad input");
    }

    #[tokio::test]
    async fn test_probe_missing_binary() {
        let transcoder = transcoder_with_binary("definitely-not-a-real-binary");
        assert!(!transcoder.probe().await);
    }

    #[tokio::test]
    async fn test_nonzero_exit_maps_to_conversion_failed() {
        let dir = tempfile::tempdir().unwrap();
        let pair = ScratchPair::new(dir.path(), "wav", OutputFormat::Ogg);
        // `false` ignores its arguments and exits 1, standing in for a
        // transcoder that rejects the input.
        let transcoder = transcoder_with_binary("false");

        let err = transcoder
            .convert(&pair, b"not audio", OutputFormat::Ogg, "128k", &UploadInfo::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::ConversionFailed { .. }));
        // The input file was written before the tool ran.
        assert!(pair.input_path.exists());
        pair.cleanup();
    }

    #[tokio::test]
    async fn test_zero_exit_without_output_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pair = ScratchPair::new(dir.path(), "", OutputFormat::Mp3);
        // `true` exits 0 but writes nothing; reading the output must fail.
        let transcoder = transcoder_with_binary("true");

        let err = transcoder
            .convert(&pair, b"data", OutputFormat::Mp3, "128k", &UploadInfo::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Io(_)));
        pair.cleanup();
    }

    #[tokio::test]
    async fn test_zero_exit_with_output_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let pair = ScratchPair::new(dir.path(), "", OutputFormat::Ogg);
        std::fs::write(&pair.output_path, b"converted").unwrap();
        let transcoder = transcoder_with_binary("true");

        let bytes = transcoder
            .convert(&pair, b"data", OutputFormat::Ogg, "128k", &UploadInfo::default())
            .await
            .unwrap();

        assert_eq!(&bytes[..], b"converted");
        pair.cleanup();
        assert!(!Path::new(&pair.input_path).exists());
        assert!(!Path::new(&pair.output_path).exists());
    }
}
