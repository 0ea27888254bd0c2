use std::path::PathBuf;

use thiserror::Error;

/// Tag prefixed to every user-facing error message
pub const TOOL_TAG: &str = "[wav-normalizer]";

/// Main error type for audio normalization
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The input path does not exist
    #[error("[wav-normalizer] Error: No such file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The header of the input file could not be opened or read
    #[error("[wav-normalizer] Failed to read header of {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder ran but exited with a non-zero status
    #[error("[wav-normalizer] Failed to convert audio file: {stderr}")]
    EncoderFailure {
        /// Exit code, `None` when the process was terminated by a signal
        code: Option<i32>,
        stderr: String,
    },

    /// The encoder process could not be launched at all
    #[error("[wav-normalizer] Failed to launch encoder {program}: {source}")]
    EncoderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Replacing the original file with the re-encoded one failed
    #[error("[wav-normalizer] Failed to replace {} with {}: {source}", .to.display(), .from.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No file name could be derived from the input path
    #[error("[wav-normalizer] Invalid input path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Configuration file error
    #[error("[wav-normalizer] Configuration error: {0}")]
    Config(String),

    /// A standard I/O error
    #[error("[wav-normalizer] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    /// Whether this error came from the encoder exiting unsuccessfully
    pub fn is_encoder_failure(&self) -> bool {
        matches!(self, NormalizeError::EncoderFailure { .. })
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NormalizeError>;
