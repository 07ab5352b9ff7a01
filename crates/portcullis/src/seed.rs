//! Static policy seeding.
//!
//! Seeds carry the global tuples every deployment needs (sign-up endpoints,
//! account-role grants). Applying a seed adds only what is missing, so it
//! runs safely on every start.
//!
//! CSV seeds use one tuple per line:
//!
//! ```text
//! # global endpoints
//! p, everyone, /users/me, (GET)|(PATCH)|(DELETE)
//! p, requester, /projects, POST
//! p, banned, /projects, POST, deny
//! g, admin, requester
//! ```
//!
//! TOML seeds use `[[policy]]` and `[[grouping]]` tables.

use std::fs;
use std::path::{Path, PathBuf};

use portcullis_store::PolicyStore;
use portcullis_types::{Effect, GroupingRule, PolicyRule};
use serde::Deserialize;
use tracing::info;

use crate::error::{PortcullisError, Result};

/// Tuples read from one seed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeedFile {
    #[serde(default, rename = "policy")]
    pub policies: Vec<PolicyRule>,
    #[serde(default, rename = "grouping")]
    pub groupings: Vec<GroupingRule>,
}

/// Outcome of applying a seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Tuples that were not present before.
    pub added: usize,
    /// Tuples already present.
    pub skipped: usize,
}

impl SeedFile {
    /// Reads a seed file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PortcullisError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Self::parse_csv(&text, path),
            Some("toml") => Self::parse_toml(&text, path),
            _ => Err(PortcullisError::UnsupportedSeedFormat(path.to_path_buf())),
        }
    }

    /// Parses casbin-style CSV. `path` is only used in error messages.
    pub fn parse_csv(text: &str, path: &Path) -> Result<Self> {
        let mut seed = SeedFile::default();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fail = |reason: String| PortcullisError::Seed {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };

            let fields: Vec<&str> = trimmed.split(',').map(unquote).collect();
            if fields.iter().any(|field| field.is_empty()) {
                return Err(fail("empty field".to_string()));
            }

            match fields.as_slice() {
                ["p", subject, object, action] => {
                    seed.policies.push(PolicyRule::new(*subject, *object, *action));
                }
                ["p", subject, object, action, effect] => {
                    let effect: Effect = effect.parse().map_err(|e| fail(format!("{e}")))?;
                    seed.policies
                        .push(PolicyRule::new(*subject, *object, *action).with_effect(effect));
                }
                ["g", principal, role] => {
                    seed.groupings.push(GroupingRule::new(*principal, *role));
                }
                ["p", ..] => {
                    return Err(fail(format!(
                        "policy line needs 3 or 4 fields after 'p', found {}",
                        fields.len() - 1
                    )));
                }
                ["g", ..] => {
                    return Err(fail(format!(
                        "grouping line needs 2 fields after 'g', found {}",
                        fields.len() - 1
                    )));
                }
                [kind, ..] => {
                    return Err(fail(format!("unknown line type '{kind}'")));
                }
                [] => {}
            }
        }

        Ok(seed)
    }

    pub fn parse_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| PortcullisError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.policies.len() + self.groupings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(field)
}

/// Adds every policy tuple not already present and saves once.
pub fn migrate_policies(store: &PolicyStore, policies: &[PolicyRule]) -> Result<SeedReport> {
    apply(
        store,
        &SeedFile {
            policies: policies.to_vec(),
            groupings: Vec::new(),
        },
    )
}

/// Adds every tuple of `seed` not already present and saves once.
pub fn apply(store: &PolicyStore, seed: &SeedFile) -> Result<SeedReport> {
    let mut added = store.add_policies(&seed.policies)?;
    for grouping in &seed.groupings {
        if store.add_role_for_user(&grouping.principal, &grouping.role)? {
            added += 1;
        }
    }
    store.save()?;

    let report = SeedReport {
        added,
        skipped: seed.len() - added,
    };
    info!(
        added = report.added,
        skipped = report.skipped,
        "seed applied"
    );
    Ok(report)
}

/// Loads and applies a seed file.
pub fn apply_file(store: &PolicyStore, path: impl AsRef<Path>) -> Result<SeedReport> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let seed = SeedFile::load(&path)?;
    info!(path = %path.display(), tuples = seed.len(), "seed file loaded");
    apply(store, &seed)
}
