//! Decision engine.
//!
//! Answers `(subject, object, action)` questions against the current policy
//! state. Enforcement is a pure read: it never mutates the store.

use std::sync::Arc;

use portcullis_store::{PolicyStore, PolicyView, StoreError};
use portcullis_types::{AuthzRequest, DEFAULT_SCOPE, Decision, Effect, EffectMode, PolicyRule};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::endpoint::EndpointRule;
use crate::error::{AuthzError, Result};
use crate::matcher::RequestMatcher;

/// Placeholder replaced by the first path argument in endpoint resources.
pub const DEFAULT_PLACEHOLDER: &str = "{id}";

/// Model parameters that shape how requests are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// How allow and deny matches combine.
    pub effect: EffectMode,
    /// Action used for endpoints that declare no scope.
    pub default_scope: String,
    /// Token substituted in endpoint resources.
    pub placeholder: String,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            effect: EffectMode::default(),
            default_scope: DEFAULT_SCOPE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Outcome of one evaluation together with the tuples that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub request: AuthzRequest,
    pub decision: Decision,
    /// Every tuple that matched the request, allow and deny alike.
    pub matched: Vec<PolicyRule>,
}

/// Policy decision engine.
///
/// Shares the [`PolicyStore`] with the lifecycle service, so grants become
/// visible to the next enforcement without any reload.
#[derive(Debug, Clone)]
pub struct Enforcer {
    store: Arc<PolicyStore>,
    model: Model,

    /// Whether to log each decision.
    audit_enabled: bool,
}

impl Enforcer {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self {
            store,
            model: Model::default(),
            audit_enabled: true,
        }
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Disables per-decision logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Evaluates a request, surfacing store failures.
    pub fn try_enforce(&self, request: &AuthzRequest) -> std::result::Result<Decision, StoreError> {
        let decision = self
            .store
            .with_view(|view| evaluate(view, request, self.model.effect).0)?;

        if self.audit_enabled {
            debug!(
                subject = %request.subject,
                object = %request.object,
                action = %request.action,
                decision = %decision,
                "Authorization decision"
            );
        }

        Ok(decision)
    }

    /// Evaluates a request.
    ///
    /// A store failure is logged as an operational error and reported as
    /// [`Decision::Abstain`], which gates treat as a refusal.
    pub fn enforce_request(&self, request: &AuthzRequest) -> Decision {
        match self.try_enforce(request) {
            Ok(decision) => decision,
            Err(e) => {
                error!(
                    subject = %request.subject,
                    object = %request.object,
                    action = %request.action,
                    error = %e,
                    "Policy store unavailable during enforcement"
                );
                Decision::Abstain
            }
        }
    }

    pub fn enforce(&self, subject: &str, object: &str, action: &str) -> Decision {
        self.enforce_request(&AuthzRequest::new(subject, object, action))
    }

    /// Gate form of [`Enforcer::try_enforce`]: only `Allow` passes.
    pub fn require(&self, request: &AuthzRequest) -> Result<()> {
        match self.try_enforce(request)? {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AuthzError::Denied {
                request: request.clone(),
            }),
            Decision::Abstain => Err(AuthzError::Abstained {
                request: request.clone(),
            }),
        }
    }

    /// Builds the concrete request for an endpoint invocation.
    pub fn resolve_endpoint(
        &self,
        subject: &str,
        rule: &EndpointRule,
        path_args: &[&str],
    ) -> Result<AuthzRequest> {
        let object = rule.resolve(&self.model.placeholder, path_args).ok_or_else(|| {
            AuthzError::UnresolvedPlaceholder {
                resource: rule.resource.clone(),
                placeholder: self.model.placeholder.clone(),
            }
        })?;
        Ok(AuthzRequest::new(
            subject,
            object,
            rule.action(&self.model.default_scope),
        ))
    }

    /// Authorizes one endpoint invocation.
    ///
    /// The placeholder in the rule's resource is filled from the first path
    /// argument and a missing scope falls back to the model's default.
    pub fn authorize(&self, subject: &str, rule: &EndpointRule, path_args: &[&str]) -> Decision {
        match self.resolve_endpoint(subject, rule, path_args) {
            Ok(request) => self.enforce_request(&request),
            Err(e) => {
                warn!(
                    subject = %subject,
                    resource = %rule.resource,
                    error = %e,
                    "Endpoint rule could not be resolved"
                );
                Decision::Abstain
            }
        }
    }

    /// Evaluates a request and reports the tuples that matched.
    pub fn explain(&self, request: &AuthzRequest) -> std::result::Result<Explanation, StoreError> {
        let (decision, matched) = self
            .store
            .with_view(|view| evaluate(view, request, self.model.effect))?;
        Ok(Explanation {
            request: request.clone(),
            decision,
            matched,
        })
    }

    /// Allow tuples the subject holds directly or through inherited roles.
    pub fn implicit_permissions(
        &self,
        subject: &str,
    ) -> std::result::Result<Vec<PolicyRule>, StoreError> {
        self.store.with_view(|view| {
            let mut identities = view.roles().implicit_roles(subject);
            identities.push(subject.to_string());
            view.policies()
                .filter(|rule| rule.effect == Effect::Allow)
                .filter(|rule| identities.iter().any(|id| *id == rule.subject))
                .cloned()
                .collect()
        })
    }
}

fn evaluate(
    view: &PolicyView<'_>,
    request: &AuthzRequest,
    effect: EffectMode,
) -> (Decision, Vec<PolicyRule>) {
    let matcher = RequestMatcher::new(request, view.roles());
    let matched: Vec<PolicyRule> = view
        .policies()
        .filter(|rule| matcher.matches(rule))
        .cloned()
        .collect();

    let any_allow = matched.iter().any(|rule| rule.effect == Effect::Allow);
    let any_deny = matched.iter().any(|rule| rule.effect == Effect::Deny);
    (effect.combine(any_allow, any_deny), matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_store::{MemoryAdapter, PolicyAdapter, PolicySnapshot};
    use portcullis_types::{GroupingRule, Verb, member_role};

    fn enforcer_with(policies: &[PolicyRule], groupings: &[(&str, &str)]) -> Enforcer {
        let store = Arc::new(PolicyStore::in_memory());
        store.add_policies(policies).unwrap();
        for (user, role) in groupings {
            store.add_role_for_user(user, role).unwrap();
        }
        Enforcer::new(store).without_audit()
    }

    fn project_fixture() -> Enforcer {
        enforcer_with(
            &[
                PolicyRule::new("u1", "/projects/p1", "(PATCH)|(DELETE)"),
                PolicyRule::new("u1", "/projects/p1/:resource", "(GET)|(POST)|(DELETE)"),
                PolicyRule::new("member[p1]", "/projects/p1/:resource", "GET"),
            ],
            &[("u1", "member[p1]"), ("u2", "member[p1]")],
        )
    }

    #[test]
    fn owner_and_member_rights() {
        let enforcer = project_fixture();

        assert_eq!(enforcer.enforce("u1", "/projects/p1", "PATCH"), Decision::Allow);
        assert_eq!(enforcer.enforce("u1", "/projects/p1/data", "POST"), Decision::Allow);
        assert_eq!(enforcer.enforce("u2", "/projects/p1/data", "GET"), Decision::Allow);
        assert_eq!(enforcer.enforce("u2", "/projects/p1/data", "POST"), Decision::Abstain);
        assert_eq!(enforcer.enforce("u2", "/projects/p1", "PATCH"), Decision::Abstain);
    }

    #[test]
    fn empty_store_abstains() {
        let enforcer = enforcer_with(&[], &[]);
        assert_eq!(enforcer.enforce("u1", "/projects/p1", "GET"), Decision::Abstain);
    }

    #[test]
    fn wildcard_does_not_span_segments() {
        let enforcer = project_fixture();
        assert_eq!(
            enforcer.enforce("u2", "/projects/p1/data/extra", "GET"),
            Decision::Abstain
        );
    }

    #[test]
    fn unknown_subject_never_allowed() {
        let enforcer = project_fixture();
        assert!(!enforcer.enforce("stranger", "/projects/p1/data", "GET").is_allowed());
    }

    #[test]
    fn deny_overrides_allow() {
        let enforcer = enforcer_with(
            &[
                PolicyRule::new("member[p1]", "/projects/p1/:resource", "GET"),
                PolicyRule::deny("u2", "/projects/p1/secret", "GET"),
            ],
            &[("u2", "member[p1]")],
        );

        assert_eq!(enforcer.enforce("u2", "/projects/p1/secret", "GET"), Decision::Deny);
        assert_eq!(enforcer.enforce("u2", "/projects/p1/open", "GET"), Decision::Allow);
    }

    #[test]
    fn allow_override_mode() {
        let enforcer = enforcer_with(
            &[
                PolicyRule::new("member[p1]", "/projects/p1/:resource", "GET"),
                PolicyRule::deny("u2", "/projects/p1/secret", "GET"),
            ],
            &[("u2", "member[p1]")],
        )
        .with_model(Model {
            effect: EffectMode::AllowOverride,
            ..Model::default()
        });

        assert_eq!(enforcer.enforce("u2", "/projects/p1/secret", "GET"), Decision::Allow);
    }

    #[test]
    fn grants_visible_without_reload() {
        let enforcer = enforcer_with(&[], &[]);
        assert_eq!(enforcer.enforce("u1", "/projects/p1", "PATCH"), Decision::Abstain);

        enforcer
            .store()
            .add_policy(PolicyRule::new("u1", "/projects/p1", "(PATCH)|(DELETE)"))
            .unwrap();
        assert_eq!(enforcer.enforce("u1", "/projects/p1", "PATCH"), Decision::Allow);
    }

    #[test]
    fn enforcement_does_not_mutate() {
        let enforcer = project_fixture();
        enforcer.store().save().unwrap();

        let _ = enforcer.enforce("u1", "/projects/p1", "PATCH");
        let _ = enforcer.enforce("stranger", "/projects/p1", "PATCH");

        assert!(!enforcer.store().is_dirty().unwrap());
    }

    #[test]
    fn authorize_substitutes_first_argument() {
        let enforcer = project_fixture();
        let patch = EndpointRule::new("/projects/{id}").with_verb(Verb::Patch);

        assert_eq!(enforcer.authorize("u1", &patch, &["p1"]), Decision::Allow);
        assert_eq!(enforcer.authorize("u1", &patch, &["p2"]), Decision::Abstain);
        assert_eq!(enforcer.authorize("u2", &patch, &["p1"]), Decision::Abstain);
    }

    #[test]
    fn authorize_without_argument_abstains() {
        let enforcer = project_fixture();
        let patch = EndpointRule::new("/projects/{id}").with_verb(Verb::Patch);

        assert_eq!(enforcer.authorize("u1", &patch, &[]), Decision::Abstain);
        assert!(matches!(
            enforcer.resolve_endpoint("u1", &patch, &[]),
            Err(AuthzError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn authorize_defaults_to_execute_scope() {
        let enforcer = enforcer_with(
            &[PolicyRule::new("everyone", "/users/me", "execute")],
            &[("u1", "everyone")],
        );
        let rule = EndpointRule::new("/users/me");

        assert_eq!(enforcer.authorize("u1", &rule, &[]), Decision::Allow);
    }

    #[test]
    fn require_maps_decisions_to_errors() {
        let enforcer = enforcer_with(
            &[
                PolicyRule::new("u1", "/projects/p1", "GET"),
                PolicyRule::deny("u2", "/projects/p1", "GET"),
            ],
            &[],
        );

        assert!(enforcer.require(&AuthzRequest::new("u1", "/projects/p1", "GET")).is_ok());

        let denied = enforcer
            .require(&AuthzRequest::new("u2", "/projects/p1", "GET"))
            .unwrap_err();
        assert!(matches!(denied, AuthzError::Denied { .. }));

        let abstained = enforcer
            .require(&AuthzRequest::new("u3", "/projects/p1", "GET"))
            .unwrap_err();
        assert!(matches!(abstained, AuthzError::Abstained { .. }));
    }

    #[test]
    fn explain_lists_matching_tuples() {
        let enforcer = project_fixture();
        let explanation = enforcer
            .explain(&AuthzRequest::new("u1", "/projects/p1/data", "GET"))
            .unwrap();

        assert_eq!(explanation.decision, Decision::Allow);
        assert_eq!(explanation.matched.len(), 2);
    }

    #[test]
    fn implicit_permissions_follow_roles() {
        let enforcer = project_fixture();

        let member = enforcer.implicit_permissions("u2").unwrap();
        assert_eq!(
            member,
            vec![PolicyRule::new("member[p1]", "/projects/p1/:resource", "GET")]
        );

        let owner = enforcer.implicit_permissions("u1").unwrap();
        assert_eq!(owner.len(), 3);
    }

    #[test]
    fn loaded_snapshot_is_enforced() {
        let snapshot = PolicySnapshot {
            policies: vec![PolicyRule::new(
                member_role("p9"),
                "/projects/p9/:resource",
                "GET",
            )],
            groupings: vec![GroupingRule::new("u5", member_role("p9"))],
            ..PolicySnapshot::default()
        };
        let adapter = MemoryAdapter::with_snapshot(snapshot);
        assert!(adapter.describe().contains("memory"));

        let store = Arc::new(PolicyStore::open(adapter).unwrap());
        let enforcer = Enforcer::new(store).without_audit();

        assert_eq!(enforcer.enforce("u5", "/projects/p9/readings", "GET"), Decision::Allow);
    }
}
