//! Report command handler
//!
//! Submits a report job, prints every state change and waits for the job
//! to finish. Ctrl-C stops polling a pending job.

use anyhow::Result;
use clap::Args;
use colored::*;
use jobwatch_core::domain::request::{JobRequest, Param};
use jobwatch_poller::{Config, JobPoller, JobState};
use tracing::warn;

use crate::config::Overrides;
use crate::output::{print_result, print_transition};

/// Arguments of the report command
#[derive(Args)]
pub struct ReportArgs {
    /// Report filter, repeatable (e.g. --param status=pending)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<Param>,

    /// Wait between status checks, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after polling for this many seconds
    #[arg(long)]
    max_wait_secs: Option<u64>,

    /// Print each state as a JSON line instead of text
    #[arg(long)]
    json: bool,
}

impl ReportArgs {
    /// Copies the polling options into the global overrides
    pub fn apply_to(&self, overrides: &mut Overrides) {
        overrides.poll_interval_ms = self.interval_ms;
        overrides.max_attempts = self.max_attempts;
        overrides.max_wait_secs = self.max_wait_secs;
    }

    fn request(&self) -> JobRequest {
        self.params
            .iter()
            .map(|param| (param.key.clone(), param.value.clone()))
            .collect()
    }
}

/// Submit the report job and follow it to a terminal state
pub async fn handle_report_command(args: ReportArgs, config: &Config) -> Result<()> {
    let poller = JobPoller::from_config(config)?;

    let json = args.json;
    poller.on_state_change(move |state| print_transition(state, json));

    poller.submit(args.request());

    let outcome = tokio::select! {
        state = poller.wait_for_terminal() => state,
        _ = tokio::signal::ctrl_c() => {
            if !poller.cancel() {
                warn!("Interrupted before the job was accepted");
                anyhow::bail!("interrupted while {}", poller.state().name());
            }
            poller.state()
        }
    };

    match outcome {
        JobState::Completed { result } => {
            if !json {
                print_result(&result);
            }
            Ok(())
        }
        JobState::Failed { error_message } => {
            anyhow::bail!("report job failed: {}", error_message)
        }
        JobState::Cancelled => {
            if !json {
                println!("{}", "Stopped watching the job.".dimmed());
            }
            Ok(())
        }
        other => anyhow::bail!("unexpected final state: {}", other),
    }
}
