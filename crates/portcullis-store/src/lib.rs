//! # portcullis-store: Policy Store and Role Graph
//!
//! Holds the two tuple tables the decision engine reads:
//! - **Policy tuples** `(subject, object-pattern, action-pattern, effect)`
//! - **Role bindings** `(principal, role)`, mirrored into a [`RoleGraph`]
//!
//! ## Durability
//!
//! Mutations are applied to an in-memory working set and only reach the
//! durable [`PolicyAdapter`] when [`PolicyStore::save`] is called. A domain
//! operation that touches several tuple sets calls `save()` once, at the end.
//!
//! ```
//! use portcullis_store::PolicyStore;
//! use portcullis_types::PolicyRule;
//!
//! let store = PolicyStore::in_memory();
//! store.add_policy(PolicyRule::new("alice", "/projects/p1", "(PATCH)|(DELETE)"))?;
//! store.add_role_for_user("alice", "member[p1]")?;
//! assert!(store.is_dirty()?);
//!
//! store.save()?;
//! assert!(!store.is_dirty()?);
//! # Ok::<(), portcullis_store::StoreError>(())
//! ```
//!
//! ## Adapters
//!
//! | Adapter           | Location                                   |
//! |-------------------|--------------------------------------------|
//! | [`MemoryAdapter`] | process memory                             |
//! | [`FileAdapter`]   | `<data_dir>/<database>/<collection>.json`  |

pub mod adapter;
pub mod error;
pub mod roles;
pub mod store;

pub use adapter::{FileAdapter, MemoryAdapter, PolicyAdapter, PolicySnapshot, SNAPSHOT_VERSION};
pub use error::{Result, StoreError};
pub use roles::RoleGraph;
pub use store::{PolicyStore, PolicyView};
