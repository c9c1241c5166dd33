//! Batch error types.

use thiserror::Error;

/// Error recorded against one batch item, or raised while setting up a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// LUT parsing or transform failed.
    #[error(transparent)]
    Lut(#[from] lutlab_lut::LutError),

    /// Image decoding or encoding failed.
    #[error(transparent)]
    Io(#[from] lutlab_io::IoError),

    /// Image buffer manipulation failed.
    #[error(transparent)]
    Image(#[from] lutlab_core::Error),

    /// Worker pool could not be created.
    #[error("thread pool: {0}")]
    Pool(String),

    /// Any other per-item failure.
    #[error("{0}")]
    Other(String),
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
