//! Layered configuration loading.

use crate::{Paths, PortcullisConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Loader rooted at the current directory.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "PORTCULLIS".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "PORTCULLIS")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/portcullis/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Files consulted, lowest precedence first. Missing files are skipped.
    fn layer_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::with_capacity(3);
        if self.include_user_config
            && let Ok(user) = Paths::new().user_config_file()
        {
            files.push(user);
        }
        files.push(Paths::project_config_file(&self.project_dir));
        files.push(Paths::local_config_file(&self.project_dir));
        files
    }

    /// Merges defaults, the user file, `portcullis.toml`,
    /// `portcullis.local.toml`, then the environment.
    ///
    /// Environment keys use `__` between section and field, e.g.
    /// `PORTCULLIS_STORE__DATA_DIR`, so field names keep their underscores.
    pub fn load(self) -> Result<PortcullisConfig> {
        let defaults = config::Config::try_from(&PortcullisConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        for file in self.layer_files() {
            if !file.exists() {
                continue;
            }
            tracing::debug!(path = %file.display(), "merging config file");
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let mut merged: PortcullisConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        merged.resolve_paths(&self.project_dir);
        merged
            .validate()
            .context("Configuration failed validation")?;

        Ok(merged)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
