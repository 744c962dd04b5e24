//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod report;
mod status;

pub use report::ReportArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::{Overrides, load_config};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a report job and wait for its result
    Report(ReportArgs),
    /// Check the status of an accepted job once
    Status {
        /// Job ID returned by the backend
        job_id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `overrides` - Global options given on the command line
pub async fn handle_command(command: Commands, mut overrides: Overrides) -> Result<()> {
    match command {
        Commands::Report(args) => {
            args.apply_to(&mut overrides);
            let config = load_config(overrides)?;
            report::handle_report_command(args, &config).await
        }
        Commands::Status { job_id } => {
            let config = load_config(overrides)?;
            status::handle_status_command(&job_id, &config).await
        }
    }
}
