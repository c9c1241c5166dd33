//! LUT error types.

use thiserror::Error;

/// Result type for LUT operations.
pub type LutResult<T> = Result<T, LutError>;

/// Errors that can occur during LUT parsing and application.
#[derive(Debug, Error)]
pub enum LutError {
    /// Malformed LUT text (missing size directive, bad numbers).
    #[error("format error: {0}")]
    Format(String),

    /// The resource or lattice cannot be used for a 3D transform.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Image buffer could not be built.
    #[error("image error: {0}")]
    Image(#[from] lutlab_core::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
