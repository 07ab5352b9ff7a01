//! Integration tests for CLI commands.
//!
//! Each test works in its own project directory, so the file-backed store
//! lives under a temporary `.portcullis/data`.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SEED: &str = "\
# static policies
p, everyone, /users/me, (GET)|(PATCH)|(DELETE)
p, requester, /projects, POST
g, u1, everyone
g, u1, requester
";

fn portcullis(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("portcullis").unwrap();
    cmd.arg("--project-dir").arg(project).arg("--no-color");
    cmd
}

fn seeded_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let seed = temp.path().join("static.csv");
    fs::write(&seed, SEED).unwrap();

    portcullis(temp.path())
        .arg("seed")
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added: 4"));

    temp
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn help_lists_commands() {
    Command::cargo_bin("portcullis")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("grant"));
}

#[test]
fn version_command_succeeds() {
    Command::cargo_bin("portcullis")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn check_requires_three_arguments() {
    Command::cargo_bin("portcullis")
        .unwrap()
        .args(["check", "u1", "/projects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn config_shows_defaults_as_json() {
    let temp = TempDir::new().unwrap();
    portcullis(temp.path())
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"database\": \"portcullis\""))
        .stdout(predicate::str::contains("deny-override"));
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn seeding_twice_skips_existing_tuples() {
    let temp = seeded_project();
    let seed = temp.path().join("static.csv");

    portcullis(temp.path())
        .arg("seed")
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added: 0"))
        .stdout(predicate::str::contains("Skipped: 4"));
}

#[test]
fn seed_reports_bad_line() {
    let temp = TempDir::new().unwrap();
    let seed = temp.path().join("broken.csv");
    fs::write(&seed, "p, everyone, /users/me, GET\np, missing-action\n").unwrap();

    portcullis(temp.path())
        .arg("seed")
        .arg(&seed)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.csv:2"));
}

#[test]
fn seed_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    portcullis(temp.path())
        .args(["seed", "does-not-exist.csv"])
        .assert()
        .failure();
}

// ============================================================================
// Decisions
// ============================================================================

#[test]
fn check_allow_exits_zero() {
    let temp = seeded_project();
    portcullis(temp.path())
        .args(["check", "u1", "/projects", "POST"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOW"));
}

#[test]
fn check_abstain_exits_nonzero() {
    let temp = seeded_project();
    portcullis(temp.path())
        .args(["check", "u2", "/projects", "POST"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ABSTAIN"));
}

#[test]
fn check_json_lists_matches() {
    let temp = seeded_project();
    portcullis(temp.path())
        .args(["check", "u1", "/users/me", "PATCH", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\": \"ALLOW\""))
        .stdout(predicate::str::contains("(GET)|(PATCH)|(DELETE)"));
}

// ============================================================================
// Listing and Role Bindings
// ============================================================================

#[test]
fn policies_filter_by_subject() {
    let temp = seeded_project();
    portcullis(temp.path())
        .args(["policies", "--subject", "requester"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/projects"))
        .stdout(predicate::str::contains("/users/me").not())
        .stdout(predicate::str::contains("(1 policy)"));
}

#[test]
fn grant_then_revoke_membership() {
    let temp = seeded_project();

    portcullis(temp.path())
        .args(["grant", "u2", "member[p1]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Granted member[p1] to u2"));

    portcullis(temp.path())
        .args(["roles", "u2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("member[p1]"));

    portcullis(temp.path())
        .args(["revoke", "u2", "member[p1]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Revoked member[p1] from u2"));

    portcullis(temp.path())
        .args(["roles", "u2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("holds no roles"));
}

#[test]
fn explain_lists_inherited_permissions() {
    let temp = seeded_project();
    portcullis(temp.path())
        .args(["explain", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("everyone, requester"))
        .stdout(predicate::str::contains("/users/me"))
        .stdout(predicate::str::contains("(2 policies)"));
}

#[test]
fn project_config_selects_store_location() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("portcullis.toml"),
        "[store]\ndata_dir = \"state\"\ndatabase = \"authz\"\ncollection = \"rules\"\n",
    )
    .unwrap();

    portcullis(temp.path())
        .args(["grant", "u1", "everyone"])
        .assert()
        .success();

    assert!(temp.path().join("state/authz/rules.json").exists());
}

#[test]
fn environment_overrides_project_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("portcullis.toml"),
        "[store]\ndatabase = \"from_file\"\n\n[model]\neffect = \"deny-override\"\n",
    )
    .unwrap();

    portcullis(temp.path())
        .env("PORTCULLIS_STORE__DATABASE", "from_env")
        .env("PORTCULLIS_MODEL__EFFECT", "allow-override")
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"database\": \"from_env\""))
        .stdout(predicate::str::contains("allow-override"))
        .stdout(predicate::str::contains("from_file").not());
}

#[test]
fn environment_selects_store_location() {
    let temp = TempDir::new().unwrap();
    let env_dir = temp.path().join("env-data");
    fs::write(
        temp.path().join("portcullis.toml"),
        "[store]\ndata_dir = \"file-data\"\n",
    )
    .unwrap();

    portcullis(temp.path())
        .env("PORTCULLIS_STORE__DATA_DIR", &env_dir)
        .args(["grant", "u1", "everyone"])
        .assert()
        .success();

    assert!(env_dir.join("portcullis/policies.json").exists());
    assert!(!temp.path().join("file-data").exists());
}
