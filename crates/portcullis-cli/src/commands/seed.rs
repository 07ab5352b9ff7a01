//! Seed command.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_engine;
use crate::style::{print_labeled, print_success};

/// Applies a seed file to the configured store.
pub fn run(project_dir: &Path, file: &Path) -> Result<()> {
    let engine = open_engine(project_dir)?;
    let report = engine
        .seed(file)
        .with_context(|| format!("Failed to apply seed {}", file.display()))?;
    let location = engine.store().location();
    engine.close()?;

    print_success(&format!("Seeded {}", file.display()));
    print_labeled("Added", report.added);
    print_labeled("Skipped", report.skipped);
    print_labeled("Store", &location);
    Ok(())
}
