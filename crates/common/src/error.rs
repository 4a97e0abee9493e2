//! Error types shared across Reframe crates.

use std::path::PathBuf;

/// Top-level error type for Reframe operations.
#[derive(Debug, thiserror::Error)]
pub enum ReframeError {
    /// Caller-supplied input violates a precondition (frame shape, parameter range,
    /// sequence alignment). Never retried.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Internal fault while processing a single frame pair.
    ///
    /// Batch drivers recover from this by treating the frame as motion-free.
    #[error("Detection failed for frame {frame_index}: {message}")]
    Detection { frame_index: usize, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReframeError.
pub type ReframeResult<T> = Result<T, ReframeError>;

impl ReframeError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn detection(frame_index: usize, msg: impl Into<String>) -> Self {
        Self::Detection {
            frame_index,
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether a batch run may continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Detection { .. })
    }
}
