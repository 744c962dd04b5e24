//! Status command handler

use anyhow::{Context, Result};
use colored::*;
use jobwatch_client::JobBackend;
use jobwatch_core::domain::job::JobHandle;
use jobwatch_core::domain::status::RemoteStatus;
use jobwatch_poller::Config;

use crate::output::print_result;

/// Check a job once and print what the backend reports
pub async fn handle_status_command(job_id: &str, config: &Config) -> Result<()> {
    let client = config.build_client()?;
    let handle = JobHandle::new(job_id);

    let status = client
        .check_status(&handle)
        .await
        .with_context(|| format!("Failed to check status of job {}", handle))?;

    println!("  Job:     {}", handle.to_string().cyan());

    match status {
        RemoteStatus::Completed(result) => {
            println!("  Status:  {}", "completed".green());
            print_result(&result);
        }
        RemoteStatus::Failed(message) => {
            println!("  Status:  {}", "failed".red());
            println!("  Error:   {}", message.red());
        }
        RemoteStatus::Running(label) => {
            println!("  Status:  {}", label.yellow());
        }
    }

    Ok(())
}
