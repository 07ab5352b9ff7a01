//! Role binding commands.

use anyhow::Result;
use std::path::Path;

use super::open_engine;
use crate::style::colors::SemanticStyle;
use crate::style::{print_success, print_warn};

/// Lists the roles a principal holds, directly or inherited.
pub fn list(project_dir: &Path, principal: &str) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let direct = engine.store().roles_for_user(principal)?;
    let implicit = engine.store().implicit_roles(principal)?;

    if implicit.is_empty() {
        println!("{}", format!("{principal} holds no roles").muted());
        return Ok(());
    }

    for role in implicit {
        if direct.contains(&role) {
            println!("{role}");
        } else {
            println!("{role} {}", "(inherited)".muted());
        }
    }
    Ok(())
}

/// Binds a principal to a role.
pub fn grant(project_dir: &Path, principal: &str, role: &str) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let added = engine.store().add_role_for_user(principal, role)?;
    engine.close()?;

    if added {
        print_success(&format!("Granted {role} to {principal}"));
    } else {
        print_warn(&format!("{principal} already holds {role}"));
    }
    Ok(())
}

/// Removes a principal's binding to a role.
pub fn revoke(project_dir: &Path, principal: &str, role: &str) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let removed = engine.store().delete_role_for_user(principal, role)?;
    engine.close()?;

    if removed {
        print_success(&format!("Revoked {role} from {principal}"));
    } else {
        print_warn(&format!("{principal} does not hold {role}"));
    }
    Ok(())
}
