//! Per-request scratch files
//!
//! Each conversion gets a UUID-keyed pair of paths in the shared scratch
//! directory: `<uuid>_input[.ext]` and `<uuid>_output.<format>`. Uniqueness
//! of the identifier is the only collision defense for concurrent requests,
//! so the identifier must be collision-resistant; nothing else coordinates
//! access to the directory.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::format::OutputFormat;

/// The temp file pair for one conversion request
#[derive(Debug, Clone)]
pub struct ScratchPair {
    pub id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ScratchPair {
    /// Allocate paths for a new request.
    ///
    /// `input_ext` may be empty, in which case the input file is written
    /// without a suffix and the external tool probes the format by content.
    pub fn new(scratch_dir: &Path, input_ext: &str, format: OutputFormat) -> Self {
        let id = Uuid::new_v4().to_string();
        let input_name = if input_ext.is_empty() {
            format!("{}_input", id)
        } else {
            format!("{}_input.{}", id, input_ext)
        };
        let output_name = format!("{}_output.{}", id, format.extension());
        Self {
            input_path: scratch_dir.join(input_name),
            output_path: scratch_dir.join(output_name),
            id,
        }
    }

    /// Remove both temp files.
    ///
    /// Runs on every exit path after the response body is determined.
    /// Failures are logged and swallowed: the response is already decided
    /// and a leftover temp file must never turn a success into an error.
    pub fn cleanup(&self) {
        for path in [&self.input_path, &self.output_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_path_shape_with_extension() {
        let pair = ScratchPair::new(Path::new("/tmp"), "mp3", OutputFormat::Ogg);
        let input = pair.input_path.file_name().unwrap().to_str().unwrap();
        let output = pair.output_path.file_name().unwrap().to_str().unwrap();
        assert_eq!(input, format!("{}_input.mp3", pair.id));
        assert_eq!(output, format!("{}_output.ogg", pair.id));
    }

    #[test]
    fn test_path_shape_without_extension() {
        let pair = ScratchPair::new(Path::new("/tmp"), "", OutputFormat::Mp3);
        let input = pair.input_path.file_name().unwrap().to_str().unwrap();
        assert_eq!(input, format!("{}_input", pair.id));
        assert!(!input.contains('.'));
    }

    #[test]
    fn test_ids_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let pair = ScratchPair::new(Path::new("/tmp"), "", OutputFormat::Ogg);
            assert!(seen.insert(pair.input_path.clone()), "duplicate path generated");
        }
    }

    #[test]
    fn test_cleanup_removes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = ScratchPair::new(dir.path(), "wav", OutputFormat::Ogg);
        std::fs::write(&pair.input_path, b"in").unwrap();
        std::fs::write(&pair.output_path, b"out").unwrap();

        pair.cleanup();

        assert!(!pair.input_path.exists());
        assert!(!pair.output_path.exists());
    }

    #[test]
    fn test_cleanup_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = ScratchPair::new(dir.path(), "", OutputFormat::Ogg);
        // Nothing was ever written; cleanup must not panic or error.
        pair.cleanup();
    }
}
