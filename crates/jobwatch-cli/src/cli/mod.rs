//! CLI for tracking property import jobs.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jobwatch_core::config;

use commands::{run_config, run_watch, WatchArgs};

/// Top-level CLI for jobwatch.
#[derive(Debug, Parser)]
#[command(name = "jobwatch")]
#[command(about = "jobwatch: follow a property import job until it finishes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Track an import job and print its progress until it finishes.
    Watch {
        /// Import job identifier.
        job_id: String,

        /// API base URL (overrides `base_url` from config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Access token (overrides the token environment variable).
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        /// Skip the push stream and poll the status endpoint only.
        #[arg(long)]
        poll_only: bool,
    },

    /// Show the config file path and the effective configuration.
    Config,
}

impl CliCommand {
    /// Runs the parsed command and returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Watch {
                job_id,
                base_url,
                token,
                poll_only,
            } => {
                let args = WatchArgs {
                    base_url,
                    token,
                    poll_only,
                };
                run_watch(&cfg, &job_id, args).await
            }
            CliCommand::Config => run_config(&cfg),
        }
    }
}

#[cfg(test)]
mod tests;
