//! Portcullis operator CLI.
//!
//! Inspects and edits the policy tuples and role bindings of a Portcullis
//! deployment.
//!
//! # Quick Start
//!
//! ```bash
//! # Load static policies
//! portcullis seed casbin/static_policies.csv
//!
//! # Ask for a decision (exit code 0 only for ALLOW)
//! portcullis check u1 /projects/p1 PATCH
//!
//! # Bind a user to a project's member role
//! portcullis grant u2 'member[p1]'
//! ```

mod commands;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Portcullis - runtime authorization for project and data-record APIs.
#[derive(Parser)]
#[command(name = "portcullis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding portcullis.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Show the effective configuration.
    Config {
        /// Output format (toml, json).
        #[arg(short, long, default_value = "toml")]
        format: String,
    },

    /// Apply a seed file (.csv or .toml), adding only missing tuples.
    Seed {
        /// Path to the seed file.
        file: PathBuf,
    },

    /// Evaluate one request. Exits 0 only when the decision is ALLOW.
    Check {
        subject: String,
        object: String,
        action: String,

        /// Show the tuples that matched.
        #[arg(short, long)]
        verbose: bool,

        /// Print the decision as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List policy tuples.
    Policies {
        /// Only tuples with this subject.
        #[arg(short, long)]
        subject: Option<String>,

        /// Only tuples with this object pattern.
        #[arg(short, long)]
        object: Option<String>,
    },

    /// List the roles a principal holds.
    Roles { principal: String },

    /// Bind a principal to a role.
    Grant { principal: String, role: String },

    /// Remove a principal's binding to a role.
    Revoke { principal: String, role: String },

    /// List the permissions a subject holds, including inherited ones.
    Explain { subject: String },
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so command output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color);
    let project_dir = cli.project_dir.as_path();

    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Config { format } => commands::config::show(project_dir, &format)?,
        Commands::Seed { file } => commands::seed::run(project_dir, &file)?,
        Commands::Check {
            subject,
            object,
            action,
            verbose,
            json,
        } => {
            let allowed =
                commands::check::run(project_dir, &subject, &object, &action, verbose, json)?;
            if !allowed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Policies { subject, object } => {
            commands::policies::list(project_dir, subject.as_deref(), object.as_deref())?;
        }
        Commands::Roles { principal } => commands::roles::list(project_dir, &principal)?,
        Commands::Grant { principal, role } => {
            commands::roles::grant(project_dir, &principal, &role)?;
        }
        Commands::Revoke { principal, role } => {
            commands::roles::revoke(project_dir, &principal, &role)?;
        }
        Commands::Explain { subject } => commands::policies::explain(project_dir, &subject)?,
    }

    Ok(ExitCode::SUCCESS)
}
