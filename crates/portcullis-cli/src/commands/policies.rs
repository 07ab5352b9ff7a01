//! Policy listing.

use anyhow::Result;
use std::path::Path;

use super::open_engine;
use crate::style::print_policy_table;
use portcullis::PolicyRule;

/// Lists stored tuples, optionally filtered by subject and object.
pub fn list(project_dir: &Path, subject: Option<&str>, object: Option<&str>) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let rules: Vec<PolicyRule> = engine
        .store()
        .policies()?
        .into_iter()
        .filter(|rule| subject.is_none_or(|s| rule.subject == s))
        .filter(|rule| object.is_none_or(|o| rule.object == o))
        .collect();

    print_policy_table(&rules);
    Ok(())
}

/// Lists the allow tuples a subject holds directly or through roles.
pub fn explain(project_dir: &Path, subject: &str) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let roles = engine.store().implicit_roles(subject)?;
    let permissions = engine.enforcer().implicit_permissions(subject)?;

    if roles.is_empty() {
        println!("{subject} holds no roles");
    } else {
        println!("{subject} holds: {}", roles.join(", "));
    }
    print_policy_table(&permissions);
    Ok(())
}
