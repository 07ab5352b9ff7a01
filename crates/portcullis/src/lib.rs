//! # Portcullis
//!
//! Runtime authorization for project and data-record APIs.
//!
//! Every protected operation is checked against stored policy tuples and role
//! bindings before it runs. Domain events (project creation, data upload,
//! membership changes, account deletion) keep the tuples current through the
//! lifecycle service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Portcullis                           │
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────────────────┐ │
//! │  │ Lifecycle │ → │ Policy Store │ ← │ Enforcer (Matcher +  │ │
//! │  │ (writes)  │   │ + Role Graph │   │ Role Graph walk)     │ │
//! │  └───────────┘   └──────┬───────┘   └──────────────────────┘ │
//! │                         │ save()                              │
//! │                   ┌─────▼─────┐                               │
//! │                   │  Adapter  │                               │
//! │                   └───────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use portcullis::{Decision, Portcullis, ProjectPolicy};
//!
//! let engine = Portcullis::in_memory();
//!
//! let batch = engine.lifecycle().batch();
//! batch.add_project_policy(&ProjectPolicy::new("u1", "p1", "s1", "t1"))?;
//! batch.add_member_for_user("u2", "p1")?;
//! batch.commit()?;
//!
//! assert_eq!(engine.enforce("u1", "/projects/p1", "PATCH"), Decision::Allow);
//! assert_eq!(engine.enforce("u2", "/projects/p1/data", "GET"), Decision::Allow);
//! assert_eq!(engine.enforce("u2", "/projects/p1", "DELETE"), Decision::Abstain);
//! # Ok::<(), portcullis::StoreError>(())
//! ```

mod error;
pub mod lifecycle;
mod portcullis;
pub mod seed;

pub use error::{PortcullisError, Result};
pub use lifecycle::{DataRecordPolicy, LifecycleBatch, PolicyLifecycle, ProjectPolicy};
pub use portcullis::Portcullis;
pub use seed::{SeedFile, SeedReport};

// Re-export the engine layers
pub use portcullis_config::{ConfigLoader, PortcullisConfig};
pub use portcullis_rbac::{AuthzError, EndpointRule, Enforcer, Explanation, Model};
pub use portcullis_store::{PolicyStore, StoreError};
pub use portcullis_types::{
    AuthzRequest, COLLABORATOR, Decision, Effect, EffectMode, EVERYONE, GroupingRule, PolicyRule,
    REQUESTER, Verb, member_role,
};
