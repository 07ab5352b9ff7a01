//! Endpoint authorization metadata.
//!
//! An [`EndpointRule`] is attached to a handler and turned into a concrete
//! `(object, action)` pair when a request comes in.

use portcullis_types::Verb;
use serde::{Deserialize, Serialize};

/// Resource template and scope for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRule {
    /// Path template, e.g. `/projects/{id}`.
    pub resource: String,

    /// Action checked against policy tuples. `None` falls back to the
    /// configured default scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl EndpointRule {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_verb(self, verb: Verb) -> Self {
        self.with_scope(verb.as_str())
    }

    /// Action to check, using `default_scope` when no scope is set.
    pub fn action<'a>(&'a self, default_scope: &'a str) -> &'a str {
        self.scope.as_deref().unwrap_or(default_scope)
    }

    /// True when the resource contains `placeholder`.
    pub fn needs_argument(&self, placeholder: &str) -> bool {
        !placeholder.is_empty() && self.resource.contains(placeholder)
    }

    /// Builds the concrete object path.
    ///
    /// The first occurrence of `placeholder` is replaced by the first path
    /// argument. Returns `None` when the resource needs an argument and none
    /// was given.
    pub fn resolve(&self, placeholder: &str, path_args: &[&str]) -> Option<String> {
        if !self.needs_argument(placeholder) {
            return Some(self.resource.clone());
        }
        let arg = path_args.first()?;
        Some(self.resource.replacen(placeholder, arg, 1))
    }
}
