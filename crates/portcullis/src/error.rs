//! Error types for the Portcullis facade.

use std::path::PathBuf;

use portcullis_config::ConfigError;
use portcullis_store::StoreError;
use thiserror::Error;

/// Result type for Portcullis operations.
pub type Result<T> = std::result::Result<T, PortcullisError>;

/// Errors that can occur while bootstrapping or seeding the engine.
#[derive(Debug, Error)]
pub enum PortcullisError {
    /// Policy store error.
    #[error("policy store error: {0}")]
    Store(#[from] StoreError),

    /// A seed file line could not be parsed.
    #[error("{path}:{line}: {reason}")]
    Seed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Seed file extension is neither `.csv` nor `.toml`.
    #[error("unsupported seed file format: {0}")]
    UnsupportedSeedFormat(PathBuf),

    /// A seed file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A TOML seed file is malformed.
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
