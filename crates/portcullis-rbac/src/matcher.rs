//! Matching of one policy tuple against one concrete request.
//!
//! A tuple applies when its subject, object pattern and action pattern all
//! match. Subjects match by identity or inherited role, objects match
//! segment by segment, actions match literally or by alternation.

use std::collections::HashSet;

use portcullis_store::RoleGraph;
use portcullis_types::{AuthzRequest, PolicyRule};

/// Matches `object` against a path pattern, one `/`-separated segment at a
/// time.
///
/// A pattern segment of the form `:name` matches any single non-empty
/// segment. Every other segment must be equal. Patterns never match across
/// segment boundaries, so segment counts must agree.
///
/// ```
/// use portcullis_rbac::key_match;
///
/// assert!(key_match("/projects/:resource", "/projects/abc123"));
/// assert!(!key_match("/projects/:resource", "/projects/abc123/extra"));
/// ```
pub fn key_match(pattern: &str, object: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut object_segments = object.split('/');

    loop {
        match (pattern_segments.next(), object_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(o)) => {
                if !segment_matches(p, o) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    match pattern.strip_prefix(':') {
        Some(name) if !name.is_empty() => !segment.is_empty(),
        _ => pattern == segment,
    }
}

/// Parsed action pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPattern<'a> {
    /// A single verb, compared by equality.
    Literal(&'a str),
    /// `(V1)|(V2)|...`, matching any one `Vi`.
    Alternatives(Vec<&'a str>),
}

impl<'a> ActionPattern<'a> {
    /// Parses `(A)|(B)` into alternatives. Anything not fully in that form
    /// is a literal.
    pub fn parse(pattern: &'a str) -> Self {
        let alternatives: Option<Vec<&str>> = pattern
            .split('|')
            .map(|part| {
                part.trim()
                    .strip_prefix('(')
                    .and_then(|rest| rest.strip_suffix(')'))
            })
            .collect();

        match alternatives {
            Some(verbs) if verbs.iter().all(|verb| !verb.is_empty()) => {
                ActionPattern::Alternatives(verbs)
            }
            _ => ActionPattern::Literal(pattern),
        }
    }

    pub fn matches(&self, action: &str) -> bool {
        match self {
            ActionPattern::Literal(verb) => *verb == action,
            ActionPattern::Alternatives(verbs) => verbs.iter().any(|verb| *verb == action),
        }
    }
}

/// Matches `action` against an action pattern.
pub fn action_match(pattern: &str, action: &str) -> bool {
    ActionPattern::parse(pattern).matches(action)
}

/// Matches tuples against one request.
///
/// The subject's inherited roles are resolved once, when the matcher is
/// built, so checking each tuple is a set lookup.
#[derive(Debug)]
pub struct RequestMatcher<'r> {
    request: &'r AuthzRequest,
    identities: HashSet<String>,
}

impl<'r> RequestMatcher<'r> {
    pub fn new(request: &'r AuthzRequest, roles: &RoleGraph) -> Self {
        let mut identities: HashSet<String> =
            roles.implicit_roles(&request.subject).into_iter().collect();
        identities.insert(request.subject.clone());
        Self {
            request,
            identities,
        }
    }

    /// True when `subject` is the requester or one of its inherited roles.
    pub fn subject_matches(&self, subject: &str) -> bool {
        self.identities.contains(subject)
    }

    pub fn matches(&self, rule: &PolicyRule) -> bool {
        self.subject_matches(&rule.subject)
            && key_match(&rule.object, &self.request.object)
            && action_match(&rule.action, &self.request.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("/projects/:resource", "/projects/abc123", true ; "placeholder matches one segment")]
    #[test_case("/projects/:resource", "/projects/abc123/extra", false ; "placeholder never spans segments")]
    #[test_case("/projects/:resource", "/projects", false ; "placeholder needs a segment")]
    #[test_case("/projects/:resource", "/projects/", false ; "placeholder rejects empty segment")]
    #[test_case("/projects/p1", "/projects/p1", true ; "literal equality")]
    #[test_case("/projects/p1", "/projects/p2", false ; "literal mismatch")]
    #[test_case("/projects/p1/:resource", "/projects/p1/data", true ; "trailing placeholder")]
    #[test_case("/projects/p1/:resource", "/projects/p2/data", false ; "prefix must match")]
    #[test_case("/projects/:id/members", "/projects/p1/members", true ; "inner placeholder")]
    #[test_case("/projects/:", "/projects/:", true ; "bare colon is literal")]
    #[test_case("/users/signup", "/users/signup", true ; "static endpoint")]
    fn key_match_cases(pattern: &str, object: &str, expected: bool) {
        assert_eq!(key_match(pattern, object), expected);
    }

    #[test_case("(GET)|(POST)", "GET", true)]
    #[test_case("(GET)|(POST)", "POST", true)]
    #[test_case("(GET)|(POST)", "DELETE", false)]
    #[test_case("(GET)|(POST)", "(GET)|(POST)", false)]
    #[test_case("(PATCH)", "PATCH", true)]
    #[test_case("PATCH", "PATCH", true)]
    #[test_case("PATCH", "PATCHES", false)]
    #[test_case("(GET)|POST", "POST", false)]
    #[test_case("(GET)|POST", "(GET)|POST", true)]
    #[test_case("execute", "execute", true)]
    fn action_match_cases(pattern: &str, action: &str, expected: bool) {
        assert_eq!(action_match(pattern, action), expected);
    }

    #[test]
    fn parse_alternatives() {
        assert_eq!(
            ActionPattern::parse("(GET)|(POST)|(DELETE)"),
            ActionPattern::Alternatives(vec!["GET", "POST", "DELETE"])
        );
        assert_eq!(ActionPattern::parse("GET"), ActionPattern::Literal("GET"));
        assert_eq!(ActionPattern::parse("()"), ActionPattern::Literal("()"));
    }

    #[test]
    fn subject_matches_through_roles() {
        let mut roles = RoleGraph::new();
        roles.add_link("u2", "member[p1]");
        let request = AuthzRequest::new("u2", "/projects/p1/data", "GET");
        let matcher = RequestMatcher::new(&request, &roles);

        assert!(matcher.subject_matches("u2"));
        assert!(matcher.subject_matches("member[p1]"));
        assert!(!matcher.subject_matches("member[p2]"));
        assert!(matcher.matches(&PolicyRule::new(
            "member[p1]",
            "/projects/p1/:resource",
            "GET"
        )));
        assert!(!matcher.matches(&PolicyRule::new(
            "member[p1]",
            "/projects/p1/:resource",
            "POST"
        )));
    }

    proptest! {
        #[test]
        fn prop_literal_paths_match_themselves(segments in proptest::collection::vec("[a-z0-9-]{1,8}", 0..6)) {
            let path = format!("/{}", segments.join("/"));
            prop_assert!(key_match(&path, &path));
        }

        #[test]
        fn prop_extra_segment_never_matches(
            segments in proptest::collection::vec("[a-z0-9-]{1,8}", 1..6),
            extra in "[a-z0-9-]{1,8}",
        ) {
            let mut pattern_segments = segments.clone();
            let last = pattern_segments.len() - 1;
            pattern_segments[last] = ":resource".to_string();
            let pattern = format!("/{}", pattern_segments.join("/"));
            let base = format!("/{}", segments.join("/"));
            let object = format!("{base}/{extra}");
            prop_assert!(key_match(&pattern, &base));
            prop_assert!(!key_match(&pattern, &object));
        }

        #[test]
        fn prop_alternation_matches_exactly_its_members(
            verbs in proptest::collection::btree_set("[A-Z]{3,6}", 1..5),
            probe in "[A-Z]{3,6}",
        ) {
            let pattern = verbs.iter().map(|v| format!("({v})")).collect::<Vec<_>>().join("|");
            prop_assert_eq!(action_match(&pattern, &probe), verbs.contains(&probe));
        }
    }
}
