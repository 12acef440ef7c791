// ============================================================================
// ERROR TYPES — every failure the pixelation pipeline can surface
// ============================================================================
//
// Policy: errors carry a human-readable message and propagate unchanged to
// the CLI. There is no local recovery or silent fallback anywhere in the
// core — a failed call produces no output file and no partial data.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelError {
    /// No compute device, kernel module, or pipeline object obtainable.
    /// A hardware/environment precondition — fatal, never retried.
    #[error("GPU initialisation failed: {0}")]
    ResourceInit(String),

    /// Caller-correctable parameter problem (block size out of range,
    /// degenerate image dimensions). Surfaced before any GPU work.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// Texture or buffer allocation failure mid-dispatch. Indicates
    /// resource exhaustion or a driver fault; not retried.
    #[error("GPU command encoding failed: {0}")]
    Encoding(String),

    /// The output texture could not be read back and converted into a
    /// portable image buffer.
    #[error("output conversion failed: {0}")]
    Conversion(String),

    /// Image decode/encode failure at the codec boundary, naming the
    /// offending path.
    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl PixelError {
    /// Shorthand for codec-boundary failures.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PixelError::Io {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = PixelError::io("photos/cat.png", "could not decode image");
        let msg = err.to_string();
        assert!(msg.contains("photos/cat.png"), "got: {msg}");
        assert!(msg.contains("could not decode image"), "got: {msg}");
    }

    #[test]
    fn validation_error_is_descriptive() {
        let err = PixelError::Validation("pixel block size must be between 1 and 128, got 0".into());
        assert!(err.to_string().contains("between 1 and 128"));
    }
}
