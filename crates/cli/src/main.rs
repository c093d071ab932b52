// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln - generation run orchestration CLI

mod commands;
mod config;
mod executor;
mod host;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cancel, runs, simulate, stats, submit};
use std::path::PathBuf;

use crate::config::KilnConfig;
use crate::host::{DetachedHost, Host};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "kiln",
    version,
    about = "Kiln - staged 3D asset generation runs"
)]
struct Cli {
    /// Config file (defaults to ./kiln.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the run log (else $KILN_STATE_DIR, else $XDG_STATE_HOME/kiln)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a run and follow its progress
    Submit(submit::SubmitArgs),
    /// Create several runs and drive them all
    Simulate(simulate::SimulateArgs),
    /// Inspect runs
    Runs {
        #[command(subcommand)]
        command: runs::RunsCommand,
    },
    /// Cancel an unfinished run
    Cancel {
        /// Run id or unique prefix
        id: String,
    },
    /// Start a new run from a failed one
    Retry(submit::RetryArgs),
    /// Outcome counts for a user
    Stats {
        /// User whose runs are counted
        #[arg(long)]
        user: String,
    },
}

impl Commands {
    /// Commands that print progress keep the log quiet by default
    fn follows_progress(&self) -> bool {
        match self {
            Commands::Submit(args) => !args.detach,
            Commands::Retry(args) => !args.detach,
            Commands::Simulate(_) => true,
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(if cli.command.follows_progress() {
        "warn"
    } else {
        "info"
    });

    let mut config = KilnConfig::load(cli.config.as_deref())?;
    if let Commands::Simulate(args) = &cli.command {
        simulate::configure(args, &mut config);
    }
    let state_dir = config::state_dir(cli.state_dir)?;
    let format = cli.output;
    let detached = || DetachedHost::detached(&config, &state_dir);
    let executing = || Host::executing(&config, &state_dir);

    match cli.command {
        Commands::Submit(args) if args.detach => {
            submit::submit_detached(args, &detached()?).await?
        }
        Commands::Submit(args) => submit::submit(args, &mut executing()?, format).await?,
        Commands::Retry(args) if args.detach => {
            submit::retry_detached(args, &detached()?).await?
        }
        Commands::Retry(args) => submit::retry(args, &mut executing()?, format).await?,
        Commands::Simulate(args) => {
            simulate::simulate(args, &config, &mut executing()?, format).await?
        }
        Commands::Runs { command } => runs::handle(command, &detached()?, format).await?,
        Commands::Cancel { id } => cancel::cancel(&id, &detached()?).await?,
        Commands::Stats { user } => stats::stats(user, &detached()?, format).await?,
    }

    Ok(())
}

fn setup_logging(default: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
