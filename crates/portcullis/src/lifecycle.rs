//! Policy lifecycle service.
//!
//! Domain operations call these methods instead of building tuples by hand.
//! Each method touches the working set only; the owning domain transaction
//! calls [`PolicyLifecycle::save`] (or commits a [`LifecycleBatch`]) once,
//! after its last lifecycle call.
//!
//! Lifecycle methods are not atomic across store calls. If a later step
//! fails, earlier changes stay in the working set and the caller decides
//! whether to compensate.

use std::ops::Deref;
use std::sync::Arc;

use portcullis_store::{PolicyStore, Result};
use portcullis_types::{COLLABORATOR, EVERYONE, PolicyRule, REQUESTER, member_role};
use tracing::{info, warn};

// ============================================================================
// Resource paths
// ============================================================================

pub fn project_path(project_id: &str) -> String {
    format!("/projects/{project_id}")
}

pub fn project_resources_path(project_id: &str) -> String {
    format!("/projects/{project_id}/:resource")
}

pub fn sensor_settings_path(setting_id: &str) -> String {
    format!("/sensor-settings/{setting_id}")
}

pub fn spatiotemporal_settings_path(setting_id: &str) -> String {
    format!("/spatiotemporal-settings/{setting_id}")
}

pub fn data_record_path(record_id: &str) -> String {
    format!("/sensing-data/{record_id}")
}

pub fn data_record_resources_path(record_id: &str) -> String {
    format!("/sensing-data/{record_id}/:resource")
}

// ============================================================================
// Tuple sets
// ============================================================================

/// Identifiers of one project and the settings it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPolicy {
    pub owner_id: String,
    pub project_id: String,
    pub sensor_setting_id: String,
    pub spatiotemporal_setting_id: String,
}

impl ProjectPolicy {
    pub fn new(
        owner_id: impl Into<String>,
        project_id: impl Into<String>,
        sensor_setting_id: impl Into<String>,
        spatiotemporal_setting_id: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            project_id: project_id.into(),
            sensor_setting_id: sensor_setting_id.into(),
            spatiotemporal_setting_id: spatiotemporal_setting_id.into(),
        }
    }

    /// The `member[<project>]` role of this project.
    pub fn member_role(&self) -> String {
        member_role(&self.project_id)
    }

    /// Policy tuples granted when the project is created.
    pub fn policies(&self) -> Vec<PolicyRule> {
        let owner = self.owner_id.as_str();
        vec![
            PolicyRule::new(owner, project_path(&self.project_id), "(PATCH)|(DELETE)"),
            PolicyRule::new(
                owner,
                project_resources_path(&self.project_id),
                "(GET)|(POST)|(DELETE)",
            ),
            PolicyRule::new(owner, sensor_settings_path(&self.sensor_setting_id), "PATCH"),
            PolicyRule::new(
                owner,
                spatiotemporal_settings_path(&self.spatiotemporal_setting_id),
                "PATCH",
            ),
            PolicyRule::new(
                self.member_role(),
                project_resources_path(&self.project_id),
                "GET",
            ),
        ]
    }
}

/// Identifiers of one data record and the project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecordPolicy {
    pub uploader_id: String,
    pub project_owner_id: String,
    pub record_id: String,
    pub project_id: String,
}

impl DataRecordPolicy {
    pub fn new(
        uploader_id: impl Into<String>,
        project_owner_id: impl Into<String>,
        record_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            uploader_id: uploader_id.into(),
            project_owner_id: project_owner_id.into(),
            record_id: record_id.into(),
            project_id: project_id.into(),
        }
    }

    /// Policy tuples granted when the record is uploaded.
    pub fn policies(&self) -> Vec<PolicyRule> {
        let record = data_record_path(&self.record_id);
        let resources = data_record_resources_path(&self.record_id);
        let member = member_role(&self.project_id);
        vec![
            PolicyRule::new(&self.uploader_id, &record, "(GET)|(DELETE)"),
            PolicyRule::new(&self.uploader_id, &resources, "GET"),
            PolicyRule::new(&self.project_owner_id, &record, "(GET)|(DELETE)"),
            PolicyRule::new(&self.project_owner_id, &resources, "GET"),
            PolicyRule::new(&member, &record, "GET"),
            PolicyRule::new(&member, &resources, "GET"),
        ]
    }
}

// ============================================================================
// Service
// ============================================================================

/// Adds and removes the tuple sets that belong to domain events.
#[derive(Debug, Clone)]
pub struct PolicyLifecycle {
    store: Arc<PolicyStore>,
}

impl PolicyLifecycle {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Starts a group of lifecycle calls that is saved once on commit.
    pub fn batch(&self) -> LifecycleBatch<'_> {
        LifecycleBatch {
            lifecycle: self,
            committed: false,
        }
    }

    /// Grants the owner's rights on a new project and binds the owner to
    /// `member[<project>]`. Returns the number of tuples added.
    pub fn add_project_policy(&self, project: &ProjectPolicy) -> Result<usize> {
        let mut added = self.store.add_policies(&project.policies())?;
        if self
            .store
            .add_role_for_user(&project.owner_id, &project.member_role())?
        {
            added += 1;
        }

        info!(
            project = %project.project_id,
            owner = %project.owner_id,
            added,
            "project policies added"
        );
        Ok(added)
    }

    /// Removes the tuples added at project creation, then deletes the
    /// project's member role with every binding to it.
    pub fn remove_project_policy(&self, project: &ProjectPolicy) -> Result<usize> {
        let removed = self.store.remove_policies(&project.policies())?
            + self.store.delete_role(&project.member_role())?;

        info!(
            project = %project.project_id,
            owner = %project.owner_id,
            removed,
            "project policies removed"
        );
        Ok(removed)
    }

    pub fn remove_project_policies(&self, projects: &[ProjectPolicy]) -> Result<usize> {
        let mut removed = 0;
        for project in projects {
            removed += self.remove_project_policy(project)?;
        }
        Ok(removed)
    }

    /// Grants the uploader, the project owner and the project's members
    /// access to a new data record.
    pub fn add_data_record_policy(&self, record: &DataRecordPolicy) -> Result<usize> {
        let added = self.store.add_policies(&record.policies())?;

        info!(
            record = %record.record_id,
            project = %record.project_id,
            uploader = %record.uploader_id,
            added,
            "data record policies added"
        );
        Ok(added)
    }

    /// Removes every tuple whose object is the record's path or its
    /// sub-resource path, whoever the subject is.
    pub fn remove_data_record_policy(&self, record_id: &str) -> Result<usize> {
        let removed = self
            .store
            .remove_filtered_policy(1, &data_record_path(record_id))?
            + self
                .store
                .remove_filtered_policy(1, &data_record_resources_path(record_id))?;

        info!(record = %record_id, removed, "data record policies removed");
        Ok(removed)
    }

    pub fn remove_data_record_policies<I, S>(&self, record_ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for record_id in record_ids {
            removed += self.remove_data_record_policy(record_id.as_ref())?;
        }
        Ok(removed)
    }

    /// Binds a user to a project's member role.
    pub fn add_member_for_user(&self, user_id: &str, project_id: &str) -> Result<bool> {
        let added = self.store.add_role_for_user(user_id, &member_role(project_id))?;
        info!(user = %user_id, project = %project_id, added, "member added");
        Ok(added)
    }

    /// Unbinds a user from a project's member role.
    pub fn delete_member_for_user(&self, user_id: &str, project_id: &str) -> Result<bool> {
        let removed = self
            .store
            .delete_role_for_user(user_id, &member_role(project_id))?;
        info!(user = %user_id, project = %project_id, removed, "member removed");
        Ok(removed)
    }

    /// Deletes `member[<project>]` and every binding to it. Owner tuples on
    /// the project itself are left alone.
    pub fn delete_member_role(&self, project_id: &str) -> Result<usize> {
        let removed = self.store.delete_role(&member_role(project_id))?;
        info!(project = %project_id, removed, "member role deleted");
        Ok(removed)
    }

    /// Sign-up roles for a requester account.
    pub fn add_requester_for_user(&self, user_id: &str) -> Result<usize> {
        self.add_account_roles(user_id, REQUESTER)
    }

    /// Sign-up roles for a collaborator account.
    pub fn add_collaborator_for_user(&self, user_id: &str) -> Result<usize> {
        self.add_account_roles(user_id, COLLABORATOR)
    }

    fn add_account_roles(&self, user_id: &str, account_role: &str) -> Result<usize> {
        let mut added = 0;
        for role in [EVERYONE, account_role] {
            if self.store.add_role_for_user(user_id, role)? {
                added += 1;
            }
        }
        info!(user = %user_id, role = %account_role, added, "account roles added");
        Ok(added)
    }

    /// Removes every tuple with the user as subject and every binding from
    /// the user.
    pub fn delete_user(&self, user_id: &str) -> Result<usize> {
        let removed = self.store.delete_user(user_id)?;
        info!(user = %user_id, removed, "user policies removed");
        Ok(removed)
    }

    /// Persists the working set. Call once, after the last lifecycle call of
    /// a domain transaction.
    pub fn save(&self) -> Result<bool> {
        self.store.save()
    }
}

/// Groups lifecycle calls of one domain transaction.
///
/// [`LifecycleBatch::commit`] performs the single save. Dropping a batch
/// without committing leaves the changes in memory only.
#[must_use = "a lifecycle batch must be committed to persist its changes"]
pub struct LifecycleBatch<'a> {
    lifecycle: &'a PolicyLifecycle,
    committed: bool,
}

impl LifecycleBatch<'_> {
    /// Saves the working set. Returns whether anything was written.
    pub fn commit(mut self) -> Result<bool> {
        self.committed = true;
        self.lifecycle.save()
    }
}

impl Deref for LifecycleBatch<'_> {
    type Target = PolicyLifecycle;

    fn deref(&self) -> &Self::Target {
        self.lifecycle
    }
}

impl Drop for LifecycleBatch<'_> {
    fn drop(&mut self) {
        if !self.committed && self.lifecycle.store.is_dirty().unwrap_or(false) {
            warn!(
                location = %self.lifecycle.store.location(),
                "lifecycle batch dropped without commit; changes are not durable"
            );
        }
    }
}
