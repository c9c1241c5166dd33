//! Clustering error types.

use thiserror::Error;

/// Result type for clustering and snapshot operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors that can occur while clustering or persisting results.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Fewer members than requested clusters.
    #[error("insufficient data: {members} members for k = {k}")]
    InsufficientData {
        /// Members available
        members: usize,
        /// Requested cluster count
        k: usize,
    },

    /// Malformed request (k = 0, empty metric, non-finite features).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown LUT id, run, tree or parent path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Snapshot name already taken under the unique-name policy.
    #[error("duplicate snapshot name: {0}")]
    DuplicateName(String),

    /// Backing store rejected the operation (for example, an id collision).
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored records break the parent/path/level invariants.
    #[error("hierarchy invariant violated: {0}")]
    Hierarchy(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
