//! Configuration management for Portcullis
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (PORTCULLIS_* prefix, highest precedence)
//! 2. portcullis.local.toml (gitignored, local overrides)
//! 3. portcullis.toml (git-tracked, project config)
//! 4. ~/.config/portcullis/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use portcullis_types::{DEFAULT_SCOPE, EffectMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Portcullis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortcullisConfig {
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub seed: SeedConfig,
}

/// Where policy tuples are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root directory of the file backend.
    pub data_dir: PathBuf,
    pub database: String,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: PathBuf::from(".portcullis/data"),
            database: "portcullis".to_string(),
            collection: "policies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    File,
    Memory,
}

/// How requests are evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub effect: EffectMode,
    pub default_scope: String,
    pub placeholder: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            effect: EffectMode::DenyOverride,
            default_scope: DEFAULT_SCOPE.to_string(),
            placeholder: "{id}".to_string(),
        }
    }
}

/// Static policies applied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub path: Option<PathBuf>,
    pub on_open: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            path: None,
            on_open: true,
        }
    }
}

impl PortcullisConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Create an ephemeral configuration with no seed
    pub fn in_memory() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.store.data_dir.is_relative() {
            self.store.data_dir = base.join(&self.store.data_dir);
        }

        if let Some(seed) = &self.seed.path {
            if seed.is_relative() {
                self.seed.path = Some(base.join(seed));
            }
        }
    }

    /// Reject settings no store or model can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.database.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.database must not be empty".to_string(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.collection must not be empty".to_string(),
            ));
        }
        if self.model.default_scope.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.default_scope must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseError {
            path: origin.into(),
            source,
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}
