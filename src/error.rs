use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskewError {
    #[error("Failed to read input: {0}")]
    ReadError(String),

    #[error("Failed to rasterize page {page}: {reason}")]
    RasterizationError { page: usize, reason: String },

    #[error("Failed to encode output: {0}")]
    EncodeError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskewError {
    /// Shorthand for a rasterization failure on a zero-based page index
    pub fn page(index: usize, reason: impl Into<String>) -> Self {
        Self::RasterizationError {
            page: index + 1,
            reason: reason.into(),
        }
    }
}
