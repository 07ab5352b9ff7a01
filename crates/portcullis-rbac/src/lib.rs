//! # portcullis-rbac: Matcher and Decision Engine
//!
//! Evaluates `(subject, object, action)` requests against the tuples held by
//! a [`portcullis_store::PolicyStore`]:
//! - **Subject** matches by identity or through an inherited role
//! - **Object** matches segment by segment, `:name` standing for one segment
//! - **Action** matches literally or through `(A)|(B)` alternation
//!
//! ## Decisions
//!
//! | Matches                 | Deny override (default) | Allow override |
//! |-------------------------|-------------------------|----------------|
//! | none                    | ABSTAIN                 | ABSTAIN        |
//! | allow only              | ALLOW                   | ALLOW          |
//! | deny only               | DENY                    | DENY           |
//! | allow and deny          | DENY                    | ALLOW          |
//!
//! `ABSTAIN` is never permission. [`Enforcer::require`] turns anything but
//! `ALLOW` into an [`AuthzError`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use portcullis_rbac::{EndpointRule, Enforcer};
//! use portcullis_store::PolicyStore;
//! use portcullis_types::{Decision, PolicyRule, Verb};
//!
//! let store = Arc::new(PolicyStore::in_memory());
//! store.add_policy(PolicyRule::new("alice", "/projects/p1", "(PATCH)|(DELETE)"))?;
//!
//! let enforcer = Enforcer::new(store);
//! let rule = EndpointRule::new("/projects/{id}").with_verb(Verb::Patch);
//!
//! assert_eq!(enforcer.authorize("alice", &rule, &["p1"]), Decision::Allow);
//! assert_eq!(enforcer.authorize("bob", &rule, &["p1"]), Decision::Abstain);
//! # Ok::<(), portcullis_store::StoreError>(())
//! ```

pub mod endpoint;
pub mod enforcement;
pub mod error;
pub mod matcher;

pub use endpoint::EndpointRule;
pub use enforcement::{DEFAULT_PLACEHOLDER, Enforcer, Explanation, Model};
pub use error::{AuthzError, Result};
pub use matcher::{ActionPattern, RequestMatcher, action_match, key_match};
