//! Jobwatch CLI
//!
//! Command-line interface for submitting report jobs and watching them
//! until they finish.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Overrides;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Submit report jobs and watch them finish", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(long, env = "JOBWATCH_URL")]
    url: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so job output on stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "jobwatch_cli=info,jobwatch_poller=info,jobwatch_client=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        url: cli.url,
        request_timeout_secs: cli.request_timeout_secs,
        ..Default::default()
    };

    handle_command(cli.command, overrides).await
}
