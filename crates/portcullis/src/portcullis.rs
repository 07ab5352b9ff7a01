//! Main entry point for the Portcullis engine.
//!
//! `Portcullis` wires the policy store, the decision engine and the
//! lifecycle service together over one shared working set.

use std::path::Path;
use std::sync::Arc;

use portcullis_config::{ModelConfig, PortcullisConfig, StoreBackend};
use portcullis_rbac::{EndpointRule, Enforcer, Model};
use portcullis_store::{FileAdapter, PolicyStore};
use portcullis_types::Decision;
use tracing::info;

use crate::error::Result;
use crate::lifecycle::PolicyLifecycle;
use crate::seed::{self, SeedReport};

fn model_from_config(config: &ModelConfig) -> Model {
    Model {
        effect: config.effect,
        default_scope: config.default_scope.clone(),
        placeholder: config.placeholder.clone(),
    }
}

/// An authorization engine instance.
///
/// Built explicitly with [`Portcullis::open`] or [`Portcullis::in_memory`]
/// and shut down with [`Portcullis::close`]. Handles returned by
/// [`Portcullis::enforcer`] and [`Portcullis::lifecycle`] share its store.
#[derive(Debug, Clone)]
pub struct Portcullis {
    store: Arc<PolicyStore>,
    enforcer: Enforcer,
    lifecycle: PolicyLifecycle,
}

impl Portcullis {
    /// Opens the configured store and applies the configured seed.
    pub fn open(config: &PortcullisConfig) -> Result<Self> {
        config.validate()?;

        let store = match config.store.backend {
            StoreBackend::File => PolicyStore::open(FileAdapter::new(
                &config.store.data_dir,
                &config.store.database,
                &config.store.collection,
            ))?,
            StoreBackend::Memory => PolicyStore::in_memory(),
        };
        let engine = Self::assemble(Arc::new(store), model_from_config(&config.model));

        if config.seed.on_open {
            if let Some(path) = &config.seed.path {
                engine.seed(path)?;
            }
        }

        info!(
            location = %engine.store.location(),
            effect = ?config.model.effect,
            "portcullis opened"
        );
        Ok(engine)
    }

    /// Creates an ephemeral engine with the default model and no seed.
    pub fn in_memory() -> Self {
        Self::assemble(Arc::new(PolicyStore::in_memory()), Model::default())
    }

    fn assemble(store: Arc<PolicyStore>, model: Model) -> Self {
        Self {
            enforcer: Enforcer::new(Arc::clone(&store)).with_model(model),
            lifecycle: PolicyLifecycle::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    pub fn lifecycle(&self) -> &PolicyLifecycle {
        &self.lifecycle
    }

    pub fn enforce(&self, subject: &str, object: &str, action: &str) -> Decision {
        self.enforcer.enforce(subject, object, action)
    }

    pub fn authorize(&self, subject: &str, rule: &EndpointRule, path_args: &[&str]) -> Decision {
        self.enforcer.authorize(subject, rule, path_args)
    }

    /// Applies a seed file and saves.
    pub fn seed(&self, path: impl AsRef<Path>) -> Result<SeedReport> {
        seed::apply_file(&self.store, path)
    }

    /// Saves any pending changes and releases the engine.
    pub fn close(self) -> Result<()> {
        let saved = self.store.save()?;
        info!(location = %self.store.location(), saved, "portcullis closed");
        Ok(())
    }
}
