//! CLI command implementations.

pub mod check;
pub mod config;
pub mod policies;
pub mod roles;
pub mod seed;
pub mod version;

use anyhow::{Context, Result};
use portcullis::{ConfigLoader, Portcullis, PortcullisConfig};
use std::path::Path;

/// Loads the layered configuration for `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<PortcullisConfig> {
    ConfigLoader::new()
        .with_project_dir(project_dir)
        .load()
        .with_context(|| format!("Failed to load configuration from {}", project_dir.display()))
}

/// Opens the engine described by the configuration in `project_dir`.
pub fn open_engine(project_dir: &Path) -> Result<Portcullis> {
    let config = load_config(project_dir)?;
    Portcullis::open(&config).context("Failed to open policy store")
}
