//! Error types for image buffer operations.
//!
//! # Usage
//!
//! ```rust
//! use lutlab_core::{Error, ImageBuf};
//!
//! let err = ImageBuf::new(2, 2, 3, vec![0.0; 5]).unwrap_err();
//! assert!(matches!(err, Error::DataLength { expected: 12, got: 5 }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reshaping image buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// Width, height or channel count is zero or overflows.
    #[error("invalid dimensions: {width}x{height}x{channels} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Requested channel count
        channels: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// Sample buffer length does not match `width * height * channels`.
    #[error("sample count mismatch: expected {expected}, got {got}")]
    DataLength {
        /// Expected number of samples
        expected: usize,
        /// Actual number of samples
        got: usize,
    },

    /// The operation needs a different channel count.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: u32,
        /// Actual channel count
        got: u32,
    },
}
