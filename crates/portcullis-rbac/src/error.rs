//! Error types for authorization checks.

use portcullis_store::StoreError;
use portcullis_types::AuthzRequest;
use thiserror::Error;

/// Error type for authorization gates.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// An explicit deny tuple matched.
    #[error("Access denied: {request}")]
    Denied { request: AuthzRequest },

    /// No tuple matched. Gates treat this the same as a deny.
    #[error("No policy grants access: {request}")]
    Abstained { request: AuthzRequest },

    /// The endpoint resource names a path placeholder with no argument to
    /// fill it.
    #[error("Resource '{resource}' needs an argument for '{placeholder}'")]
    UnresolvedPlaceholder {
        resource: String,
        placeholder: String,
    },

    /// The policy store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
