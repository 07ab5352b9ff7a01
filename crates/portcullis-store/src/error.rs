//! Error types for the policy store.

use std::path::PathBuf;
use thiserror::Error;

/// Policy store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot serve requests (poisoned state, unreachable backend).
    #[error("policy store unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the durable snapshot failed.
    #[error("policy store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The durable snapshot exists but cannot be decoded.
    #[error("corrupt policy snapshot at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Filtered removal addressed a field that policy tuples do not have.
    #[error("invalid policy field index {0} (expected 0..=3)")]
    InvalidFieldIndex(usize),
}

impl StoreError {
    /// Returns true for failures of the backing store itself, as opposed to
    /// caller mistakes. These are fatal to the enclosing domain operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
