//! # portcullis-types: Core types for `Portcullis`
//!
//! This crate contains shared types used across the `Portcullis` system:
//! - Stored tuples ([`PolicyRule`], [`GroupingRule`], [`Effect`], [`PolicyField`])
//! - Request-time types ([`AuthzRequest`], [`Decision`], [`Verb`], [`EffectMode`])
//! - Role labels ([`member_role`], [`EVERYONE`], [`REQUESTER`], [`COLLABORATOR`])

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action used when an endpoint declares no explicit scope.
pub const DEFAULT_SCOPE: &str = "execute";

/// Role every signed-up account is bound to.
pub const EVERYONE: &str = "everyone";

/// Role bound to accounts that request sensing campaigns.
pub const REQUESTER: &str = "requester";

/// Role bound to accounts that contribute sensing data.
pub const COLLABORATOR: &str = "collaborator";

/// Errors produced while parsing the textual forms of the core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid policy field index {0} (expected 0..=3)")]
    InvalidFieldIndex(usize),

    #[error("invalid policy effect: {0:?}")]
    InvalidEffect(String),

    #[error("invalid verb: {0:?}")]
    InvalidVerb(String),
}

/// Returns the parameterized role that scopes membership to one project.
///
/// ```
/// assert_eq!(portcullis_types::member_role("p-42"), "member[p-42]");
/// ```
pub fn member_role(project_id: &str) -> String {
    format!("member[{project_id}]")
}

// ============================================================================
// Stored tuples
// ============================================================================

/// Whether a matching policy grants or refuses the request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            _ => Err(TypeError::InvalidEffect(s.to_string())),
        }
    }
}

/// A stored `(subject, object-pattern, action-pattern, effect)` rule.
///
/// The derived ordering keeps persisted snapshots deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    pub subject: String,
    pub object: String,
    pub action: String,
    #[serde(default)]
    pub effect: Effect,
}

impl PolicyRule {
    /// Creates an allow rule.
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
            effect: Effect::Allow,
        }
    }

    /// Creates a deny rule.
    pub fn deny(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new(subject, object, action).with_effect(Effect::Deny)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    /// Returns the textual value stored at `field`.
    pub fn field(&self, field: PolicyField) -> &str {
        match field {
            PolicyField::Subject => &self.subject,
            PolicyField::Object => &self.object,
            PolicyField::Action => &self.action,
            PolicyField::Effect => self.effect.as_str(),
        }
    }
}

impl Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p, {}, {}, {}, {}",
            self.subject, self.object, self.action, self.effect
        )
    }
}

/// A stored `(principal, role)` inheritance edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupingRule {
    pub principal: String,
    pub role: String,
}

impl GroupingRule {
    pub fn new(principal: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            role: role.into(),
        }
    }
}

impl Display for GroupingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g, {}, {}", self.principal, self.role)
    }
}

/// Positional field of a policy tuple, as addressed by filtered removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    Subject = 0,
    Object = 1,
    Action = 2,
    Effect = 3,
}

impl TryFrom<usize> for PolicyField {
    type Error = TypeError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(PolicyField::Subject),
            1 => Ok(PolicyField::Object),
            2 => Ok(PolicyField::Action),
            3 => Ok(PolicyField::Effect),
            other => Err(TypeError::InvalidFieldIndex(other)),
        }
    }
}

// ============================================================================
// Request-time types
// ============================================================================

/// A concrete authorization question. Never contains wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthzRequest {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl AuthzRequest {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

impl Display for AuthzRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.object, self.action)
    }
}

/// Outcome of one enforcement.
///
/// `Abstain` means no policy matched in either direction. It is reported
/// separately from `Deny` but must never be read as permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Deny,
    Abstain,
}

impl Decision {
    /// Collapses the tri-state into a gate: only `Allow` lets a request through.
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
            Decision::Abstain => "ABSTAIN",
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How matching allow and deny tuples combine into one [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectMode {
    /// Any matching deny wins over any matching allow.
    #[default]
    DenyOverride,
    /// Any matching allow wins over any matching deny.
    AllowOverride,
}

impl EffectMode {
    pub fn combine(self, any_allow: bool, any_deny: bool) -> Decision {
        match (self, any_allow, any_deny) {
            (EffectMode::DenyOverride, _, true) | (EffectMode::AllowOverride, false, true) => {
                Decision::Deny
            }
            (_, true, _) => Decision::Allow,
            (_, false, false) => Decision::Abstain,
        }
    }
}

/// HTTP-like verb of the operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// The action string a verb maps to. Verbs map to themselves.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(TypeError::InvalidVerb(s.to_string())),
        }
    }
}
