//! Terminal styling for CLI output.

use std::sync::atomic::{AtomicBool, Ordering};

pub mod colors;
pub mod output;
pub mod table;

pub use output::*;
pub use table::*;

/// Set once from `--no-color` before any command prints.
static PLAIN: AtomicBool = AtomicBool::new(false);

pub fn set_no_color(value: bool) {
    PLAIN.store(value, Ordering::Relaxed);
}

pub fn no_color() -> bool {
    PLAIN.load(Ordering::Relaxed)
}
