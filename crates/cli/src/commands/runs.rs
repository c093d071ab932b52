// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kiln runs` - inspect stored runs

use crate::host::DetachedHost;
use crate::output::{self, OutputFormat, RunDetail, RunRow, RUN_HEADER};
use anyhow::Result;
use clap::Subcommand;
use kiln_core::{RunStatus, UserId};
use kiln_storage::RunFilter;

#[derive(Subcommand)]
pub enum RunsCommand {
    /// List runs, newest first
    List {
        /// Only runs owned by this user
        #[arg(long)]
        user: Option<String>,
        /// Only runs in this status (e.g. failed, coarse_gen)
        #[arg(long)]
        status: Option<RunStatus>,
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show details of a run
    Show {
        /// Run id or unique prefix
        id: String,
    },
}

pub async fn handle(command: RunsCommand, host: &DetachedHost, format: OutputFormat) -> Result<()> {
    match command {
        RunsCommand::List {
            user,
            status,
            limit,
        } => {
            let filter = RunFilter {
                user_id: user.map(UserId::from),
                status,
                limit: Some(limit),
                ..RunFilter::default()
            };
            list(&filter, host, format).await
        }
        RunsCommand::Show { id } => show(&id, host, format).await,
    }
}

async fn list(filter: &RunFilter, host: &DetachedHost, format: OutputFormat) -> Result<()> {
    let runs = host.engine().list(filter).await?;
    let rows: Vec<RunRow<'_>> = runs.iter().map(RunRow).collect();
    match format {
        OutputFormat::Text if rows.is_empty() => println!("No runs"),
        OutputFormat::Text => {
            println!("{}", RUN_HEADER);
            output::print_list(&rows, format);
        }
        OutputFormat::Json => output::print_list(&rows, format),
    }
    Ok(())
}

async fn show(id: &str, host: &DetachedHost, format: OutputFormat) -> Result<()> {
    let Some(run_id) = host.resolve(id) else {
        println!("Run not found: {}", id);
        return Ok(());
    };
    let run = host.engine().get(&run_id).await?;
    output::print(&RunDetail(&run), format);
    Ok(())
}
