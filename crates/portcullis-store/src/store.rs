//! In-memory working set of policy tuples and role bindings, flushed to a
//! [`PolicyAdapter`] on `save()`.

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use portcullis_types::{GroupingRule, PolicyField, PolicyRule};
use tracing::{debug, info};

use crate::adapter::{MemoryAdapter, PolicyAdapter, PolicySnapshot, SNAPSHOT_VERSION};
use crate::error::{Result, StoreError};
use crate::roles::RoleGraph;

#[derive(Debug, Default)]
struct PolicySet {
    policies: BTreeSet<PolicyRule>,
    groupings: BTreeSet<GroupingRule>,
    graph: RoleGraph,
    dirty: bool,
}

impl PolicySet {
    fn from_snapshot(snapshot: PolicySnapshot) -> Self {
        let mut set = PolicySet::default();
        set.policies.extend(snapshot.policies);
        for grouping in snapshot.groupings {
            set.graph.add_link(&grouping.principal, &grouping.role);
            set.groupings.insert(grouping);
        }
        set
    }

    fn to_snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            policies: self.policies.iter().cloned().collect(),
            groupings: self.groupings.iter().cloned().collect(),
        }
    }

    fn retain_policies(&mut self, mut keep: impl FnMut(&PolicyRule) -> bool) -> usize {
        let before = self.policies.len();
        self.policies.retain(|rule| keep(rule));
        before - self.policies.len()
    }

    fn retain_groupings(&mut self, mut keep: impl FnMut(&GroupingRule) -> bool) -> usize {
        let removed: Vec<GroupingRule> = self
            .groupings
            .iter()
            .filter(|grouping| !keep(grouping))
            .cloned()
            .collect();
        for grouping in &removed {
            self.groupings.remove(grouping);
            self.graph.remove_link(&grouping.principal, &grouping.role);
        }
        removed.len()
    }

    fn mark(&mut self, changed: usize) -> usize {
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }
}

/// Read-only view of the working set, valid while the store's read lock is
/// held.
pub struct PolicyView<'a> {
    set: &'a PolicySet,
}

impl<'a> PolicyView<'a> {
    pub fn policies(&self) -> impl Iterator<Item = &'a PolicyRule> + 'a {
        self.set.policies.iter()
    }

    pub fn groupings(&self) -> impl Iterator<Item = &'a GroupingRule> + 'a {
        self.set.groupings.iter()
    }

    pub fn roles(&self) -> &'a RoleGraph {
        &self.set.graph
    }
}

/// The policy store.
///
/// Mutations only touch the in-memory working set and mark it dirty;
/// durability is reached on the next [`PolicyStore::save`]. Every mutation
/// returns how many tuples actually changed, so a repeated call reports 0.
pub struct PolicyStore {
    state: RwLock<PolicySet>,
    adapter: Box<dyn PolicyAdapter>,
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore")
            .field("adapter", &self.adapter.describe())
            .finish_non_exhaustive()
    }
}

impl PolicyStore {
    /// Opens a store over `adapter`, loading its last saved snapshot.
    pub fn open(adapter: impl PolicyAdapter + 'static) -> Result<Self> {
        let adapter: Box<dyn PolicyAdapter> = Box::new(adapter);
        let snapshot = adapter.load()?;
        let set = PolicySet::from_snapshot(snapshot);

        info!(
            location = %adapter.describe(),
            policies = set.policies.len(),
            groupings = set.groupings.len(),
            "policy store opened"
        );

        Ok(Self {
            state: RwLock::new(set),
            adapter,
        })
    }

    /// Opens an empty store backed by a [`MemoryAdapter`].
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(PolicySet::default()),
            adapter: Box::new(MemoryAdapter::new()),
        }
    }

    /// Human-readable location of the durable backend.
    pub fn location(&self) -> String {
        self.adapter.describe()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PolicySet>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("policy store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PolicySet>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("policy store lock poisoned".to_string()))
    }

    /// Runs `f` against a consistent view of the working set.
    pub fn with_view<R>(&self, f: impl FnOnce(&PolicyView<'_>) -> R) -> Result<R> {
        let guard = self.read()?;
        let view = PolicyView { set: &*guard };
        Ok(f(&view))
    }

    /// Replaces the working set with the adapter's snapshot, discarding
    /// unsaved changes.
    pub fn reload(&self) -> Result<()> {
        let snapshot = self.adapter.load()?;
        let mut state = self.write()?;
        *state = PolicySet::from_snapshot(snapshot);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Policy tuples
    // ------------------------------------------------------------------

    /// Inserts each tuple not already present.
    pub fn add_policies(&self, rules: &[PolicyRule]) -> Result<usize> {
        let mut state = self.write()?;
        let added = rules
            .iter()
            .filter(|rule| state.policies.insert((*rule).clone()))
            .count();
        debug!(requested = rules.len(), added, "policies added");
        Ok(state.mark(added))
    }

    pub fn add_policy(&self, rule: PolicyRule) -> Result<bool> {
        Ok(self.add_policies(std::slice::from_ref(&rule))? == 1)
    }

    /// Deletes exact matches. Missing tuples are ignored.
    pub fn remove_policies(&self, rules: &[PolicyRule]) -> Result<usize> {
        let mut state = self.write()?;
        let removed = rules
            .iter()
            .filter(|rule| state.policies.remove(*rule))
            .count();
        debug!(requested = rules.len(), removed, "policies removed");
        Ok(state.mark(removed))
    }

    pub fn remove_policy(&self, rule: &PolicyRule) -> Result<bool> {
        Ok(self.remove_policies(std::slice::from_ref(rule))? == 1)
    }

    /// Deletes every tuple whose field at `field_index` equals `value`,
    /// whatever the other fields hold.
    pub fn remove_filtered_policy(&self, field_index: usize, value: &str) -> Result<usize> {
        let field = PolicyField::try_from(field_index)
            .map_err(|_| StoreError::InvalidFieldIndex(field_index))?;
        let mut state = self.write()?;
        let removed = state.retain_policies(|rule| rule.field(field) != value);
        debug!(field_index, value, removed, "filtered policies removed");
        Ok(state.mark(removed))
    }

    pub fn has_policy(&self, rule: &PolicyRule) -> Result<bool> {
        Ok(self.read()?.policies.contains(rule))
    }

    pub fn policies(&self) -> Result<Vec<PolicyRule>> {
        Ok(self.read()?.policies.iter().cloned().collect())
    }

    /// Tuples whose field at `field_index` equals `value`.
    pub fn filtered_policies(&self, field_index: usize, value: &str) -> Result<Vec<PolicyRule>> {
        let field = PolicyField::try_from(field_index)
            .map_err(|_| StoreError::InvalidFieldIndex(field_index))?;
        Ok(self
            .read()?
            .policies
            .iter()
            .filter(|rule| rule.field(field) == value)
            .cloned()
            .collect())
    }

    // ------------------------------------------------------------------
    // Role bindings
    // ------------------------------------------------------------------

    /// Binds `user` to `role`. Returns false if the binding already existed.
    pub fn add_role_for_user(&self, user: &str, role: &str) -> Result<bool> {
        let mut state = self.write()?;
        let added = state.groupings.insert(GroupingRule::new(user, role));
        if added {
            state.graph.add_link(user, role);
        }
        debug!(user, role, added, "role binding added");
        Ok(state.mark(usize::from(added)) == 1)
    }

    /// Unbinds `user` from `role`. Returns false if there was no binding.
    pub fn delete_role_for_user(&self, user: &str, role: &str) -> Result<bool> {
        let mut state = self.write()?;
        let removed = state.groupings.remove(&GroupingRule::new(user, role));
        if removed {
            state.graph.remove_link(user, role);
        }
        debug!(user, role, removed, "role binding removed");
        Ok(state.mark(usize::from(removed)) == 1)
    }

    /// Removes `role` entirely: every binding into it, every binding out of
    /// it, and every policy it holds as subject.
    pub fn delete_role(&self, role: &str) -> Result<usize> {
        let mut state = self.write()?;
        let bindings = state.retain_groupings(|g| g.role != role && g.principal != role);
        let policies = state.retain_policies(|rule| rule.subject != role);
        debug!(role, bindings, policies, "role deleted");
        Ok(state.mark(bindings + policies))
    }

    /// Removes every policy held by `user` and every binding of `user`.
    pub fn delete_user(&self, user: &str) -> Result<usize> {
        let mut state = self.write()?;
        let bindings = state.retain_groupings(|g| g.principal != user);
        let policies = state.retain_policies(|rule| rule.subject != user);
        debug!(user, bindings, policies, "user deleted");
        Ok(state.mark(bindings + policies))
    }

    pub fn has_grouping(&self, user: &str, role: &str) -> Result<bool> {
        Ok(self
            .read()?
            .groupings
            .contains(&GroupingRule::new(user, role)))
    }

    pub fn groupings(&self) -> Result<Vec<GroupingRule>> {
        Ok(self.read()?.groupings.iter().cloned().collect())
    }

    /// Roles `user` is bound to directly.
    pub fn roles_for_user(&self, user: &str) -> Result<Vec<String>> {
        Ok(self.read()?.graph.direct_roles(user))
    }

    /// Principals bound directly to `role`.
    pub fn users_for_role(&self, role: &str) -> Result<Vec<String>> {
        Ok(self.read()?.graph.direct_members(role))
    }

    /// Every role reachable from `principal`.
    pub fn implicit_roles(&self, principal: &str) -> Result<Vec<String>> {
        Ok(self.read()?.graph.implicit_roles(principal))
    }

    // ------------------------------------------------------------------
    // Durability
    // ------------------------------------------------------------------

    pub fn is_dirty(&self) -> Result<bool> {
        Ok(self.read()?.dirty)
    }

    /// Flushes the working set to the adapter. A clean store performs no
    /// I/O and returns `Ok(false)`.
    pub fn save(&self) -> Result<bool> {
        let mut state = self.write()?;
        if !state.dirty {
            return Ok(false);
        }

        let snapshot = state.to_snapshot();
        self.adapter.save(&snapshot)?;
        state.dirty = false;

        info!(
            location = %self.adapter.describe(),
            policies = snapshot.policies.len(),
            groupings = snapshot.groupings.len(),
            "policy store saved"
        );
        Ok(true)
    }
}
