//! Durable backends behind the policy store.
//!
//! The store keeps its working set in memory and hands a full
//! [`PolicySnapshot`] to a [`PolicyAdapter`] on every `save()`.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use portcullis_types::{GroupingRule, PolicyRule};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
    #[serde(default)]
    pub groupings: Vec<GroupingRule>,
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            policies: Vec::new(),
            groupings: Vec::new(),
        }
    }
}

/// A durable home for policy snapshots.
pub trait PolicyAdapter: Send + Sync {
    /// Loads the last saved snapshot. A backend with nothing saved yet
    /// returns an empty snapshot.
    fn load(&self) -> Result<PolicySnapshot>;

    /// Replaces the durable snapshot.
    fn save(&self, snapshot: &PolicySnapshot) -> Result<()>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

// ============================================================================
// Memory adapter
// ============================================================================

/// Keeps the "durable" snapshot in process memory.
///
/// Counts saves so callers can check that a domain transaction flushed
/// exactly once.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    snapshot: Mutex<PolicySnapshot>,
    saves: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing snapshot.
    pub fn with_snapshot(snapshot: PolicySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save()` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PolicyAdapter for MemoryAdapter {
    fn load(&self) -> Result<PolicySnapshot> {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.clone())
            .map_err(|_| StoreError::Unavailable("memory adapter lock poisoned".to_string()))
    }

    fn save(&self, snapshot: &PolicySnapshot) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory adapter lock poisoned".to_string()))?;
        *guard = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// File adapter
// ============================================================================

/// Persists the snapshot as JSON at `<data_dir>/<database>/<collection>.json`.
///
/// Writes go to a sibling temporary file which is synced and renamed over
/// the target, so readers see either the old or the new snapshot.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
}

impl FileAdapter {
    pub fn new(data_dir: impl AsRef<Path>, database: &str, collection: &str) -> Self {
        Self {
            path: data_dir
                .as_ref()
                .join(database)
                .join(format!("{collection}.json")),
        }
    }

    /// Uses an explicit snapshot file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PolicyAdapter for FileAdapter {
    fn load(&self) -> Result<PolicySnapshot> {
        if !self.path.exists() {
            return Ok(PolicySnapshot::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(PolicySnapshot::default());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, snapshot: &PolicySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let encoded = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        file.write_all(&encoded).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> PolicySnapshot {
        PolicySnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            policies: vec![PolicyRule::new("u1", "/projects/p1", "(PATCH)|(DELETE)")],
            groupings: vec![GroupingRule::new("u1", "member[p1]")],
        }
    }

    #[test]
    fn memory_adapter_counts_saves() {
        let adapter = MemoryAdapter::new();
        assert_eq!(adapter.load().unwrap(), PolicySnapshot::default());

        adapter.save(&sample()).unwrap();
        adapter.save(&sample()).unwrap();

        assert_eq!(adapter.save_count(), 2);
        assert_eq!(adapter.load().unwrap().policies.len(), 1);
    }

    #[test]
    fn file_adapter_layout() {
        let adapter = FileAdapter::new("/var/lib/portcullis", "lavlus", "casbin");
        assert_eq!(
            adapter.path(),
            Path::new("/var/lib/portcullis/lavlus/casbin.json")
        );
    }

    #[test]
    fn file_adapter_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::new(temp.path(), "db", "policies");
        assert_eq!(adapter.load().unwrap(), PolicySnapshot::default());
    }

    #[test]
    fn file_adapter_round_trip() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::new(temp.path(), "db", "policies");
        let snapshot = sample();

        adapter.save(&snapshot).unwrap();

        assert!(adapter.path().exists());
        assert!(!adapter.path().with_extension("json.tmp").exists());
        assert_eq!(adapter.load().unwrap(), snapshot);
    }

    #[test]
    fn file_adapter_reports_corruption() {
        let temp = TempDir::new().unwrap();
        let adapter = FileAdapter::at_path(temp.path().join("broken.json"));
        fs::write(adapter.path(), "{ not json").unwrap();

        let err = adapter.load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(!err.is_unavailable());
    }
}
