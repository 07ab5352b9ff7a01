//! Configuration display.

use anyhow::Result;
use std::path::Path;

use super::load_config;
use crate::style::colors::SemanticStyle;
use portcullis_config::Paths;

/// Prints the effective configuration.
pub fn show(project_dir: &Path, format: &str) -> Result<()> {
    let config = load_config(project_dir)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        _ => {
            if !Paths::is_initialized(project_dir) {
                println!(
                    "{}",
                    format!(
                        "# no portcullis.toml in {}, showing defaults",
                        project_dir.display()
                    )
                    .muted()
                );
            }
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
