//! Role inheritance graph.
//!
//! Edges run from a principal (user or role) to a role it inherits. Role
//! names are opaque labels: `member[p1]` is compared as a plain string.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Directed graph of role bindings.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    edges: HashMap<String, BTreeSet<String>>,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `principal -> role`. Returns false if the edge already existed.
    pub fn add_link(&mut self, principal: &str, role: &str) -> bool {
        self.edges
            .entry(principal.to_string())
            .or_default()
            .insert(role.to_string())
    }

    /// Removes `principal -> role`. Returns false if there was no such edge.
    pub fn remove_link(&mut self, principal: &str, role: &str) -> bool {
        let Some(roles) = self.edges.get_mut(principal) else {
            return false;
        };
        let removed = roles.remove(role);
        if roles.is_empty() {
            self.edges.remove(principal);
        }
        removed
    }

    /// Roles `principal` is bound to directly.
    pub fn direct_roles(&self, principal: &str) -> Vec<String> {
        self.edges
            .get(principal)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Principals bound directly to `role`.
    pub fn direct_members(&self, role: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .edges
            .iter()
            .filter(|(_, roles)| roles.contains(role))
            .map(|(principal, _)| principal.clone())
            .collect();
        members.sort();
        members
    }

    /// Returns true when `role` is reachable from `principal`, or when they
    /// are the same name.
    ///
    /// The walk tracks visited nodes, so cyclic bindings terminate.
    pub fn has_role(&self, principal: &str, role: &str) -> bool {
        if principal == role {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(principal);
        queue.push_back(principal);

        while let Some(current) = queue.pop_front() {
            let Some(roles) = self.edges.get(current) else {
                continue;
            };
            for next in roles {
                if next == role {
                    return true;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }

        false
    }

    /// Every role reachable from `principal`, in breadth-first order.
    /// The principal itself is not included.
    pub fn implicit_roles(&self, principal: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut found = Vec::new();
        visited.insert(principal);
        queue.push_back(principal);

        while let Some(current) = queue.pop_front() {
            let Some(roles) = self.edges.get(current) else {
                continue;
            };
            for next in roles {
                if visited.insert(next.as_str()) {
                    found.push(next.clone());
                    queue.push_back(next.as_str());
                }
            }
        }

        found
    }

    /// Number of distinct edges.
    pub fn link_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_transitive_membership() {
        let mut graph = RoleGraph::new();
        graph.add_link("alice", "member[p1]");
        graph.add_link("member[p1]", "viewer");

        assert!(graph.has_role("alice", "member[p1]"));
        assert!(graph.has_role("alice", "viewer"));
        assert!(!graph.has_role("viewer", "alice"));
        assert!(!graph.has_role("bob", "viewer"));
    }

    #[test]
    fn same_name_is_trivially_held() {
        let graph = RoleGraph::new();
        assert!(graph.has_role("everyone", "everyone"));
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = RoleGraph::new();
        graph.add_link("a", "b");
        graph.add_link("b", "c");
        graph.add_link("c", "a");

        assert!(graph.has_role("a", "c"));
        assert!(!graph.has_role("a", "z"));
        assert_eq!(graph.implicit_roles("a"), vec!["b", "c"]);
    }

    #[test]
    fn duplicate_links_are_collapsed() {
        let mut graph = RoleGraph::new();
        assert!(graph.add_link("alice", "requester"));
        assert!(!graph.add_link("alice", "requester"));
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn remove_link_drops_empty_principal() {
        let mut graph = RoleGraph::new();
        graph.add_link("alice", "requester");

        assert!(graph.remove_link("alice", "requester"));
        assert!(!graph.remove_link("alice", "requester"));
        assert!(graph.direct_roles("alice").is_empty());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn implicit_roles_breadth_first() {
        let mut graph = RoleGraph::new();
        graph.add_link("alice", "everyone");
        graph.add_link("alice", "member[p1]");
        graph.add_link("member[p1]", "reader");

        assert_eq!(
            graph.implicit_roles("alice"),
            vec!["everyone", "member[p1]", "reader"]
        );
    }

    #[test]
    fn direct_members_sorted() {
        let mut graph = RoleGraph::new();
        graph.add_link("carol", "member[p1]");
        graph.add_link("alice", "member[p1]");
        graph.add_link("bob", "member[p2]");

        assert_eq!(graph.direct_members("member[p1]"), vec!["alice", "carol"]);
    }
}
