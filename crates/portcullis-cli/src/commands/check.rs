//! Decision check.

use anyhow::Result;
use std::path::Path;

use super::open_engine;
use crate::style::{print_decision, print_policy_table};
use portcullis::{AuthzRequest, Decision};

/// Evaluates one request. Returns true only for `ALLOW`.
pub fn run(
    project_dir: &Path,
    subject: &str,
    object: &str,
    action: &str,
    verbose: bool,
    json: bool,
) -> Result<bool> {
    let engine = open_engine(project_dir)?;
    let request = AuthzRequest::new(subject, object, action);
    let explanation = engine.enforcer().explain(&request)?;

    if json {
        let value = serde_json::json!({
            "request": explanation.request,
            "decision": explanation.decision,
            "matched": explanation.matched,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_decision(explanation.decision, &request);
        if verbose {
            print_policy_table(&explanation.matched);
        }
    }

    Ok(explanation.decision == Decision::Allow)
}
