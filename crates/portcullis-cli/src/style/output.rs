//! Line printers shared by the commands.

use portcullis::{AuthzRequest, Decision};

use super::colors::{self, SemanticStyle};

/// A change that reached the store.
pub fn print_success(msg: &str) {
    println!("{} {msg}", "✓".success());
}

/// A change that left the store untouched.
pub fn print_warn(msg: &str) {
    println!("{} {msg}", "-".warning());
}

/// Indented `key: value` line under a headline.
pub fn print_labeled(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {value}", key.muted());
}

/// `ALLOW (u1, /projects/p1, PATCH)`
pub fn print_decision(decision: Decision, request: &AuthzRequest) {
    println!("{} {}", colors::decision(decision), request.muted());
}
