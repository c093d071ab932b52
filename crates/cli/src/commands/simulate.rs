// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kiln simulate` - push several runs through the engine at once

use crate::config::KilnConfig;
use crate::host::Host;
use crate::output::OutputFormat;
use anyhow::{bail, Result};
use clap::Args;
use kiln_core::RunStatistics;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of runs to create
    #[arg(long, default_value_t = 3)]
    pub runs: usize,

    /// Override the configured admission capacity
    #[arg(long)]
    pub capacity: Option<usize>,
}

/// Apply command-line overrides before the engine is built
pub fn configure(args: &SimulateArgs, config: &mut KilnConfig) {
    if let Some(capacity) = args.capacity {
        config.engine.capacity = capacity;
    }
}

pub async fn simulate(
    args: SimulateArgs,
    config: &KilnConfig,
    host: &mut Host,
    format: OutputFormat,
) -> Result<()> {
    let Some(prompt) = config.prompts.first() else {
        bail!("no prompts configured");
    };
    host.start().await?;

    let mut ids = Vec::with_capacity(args.runs);
    for n in 0..args.runs {
        let run = host
            .engine()
            .create(
                prompt.owner.clone(),
                prompt.id.clone(),
                serde_json::json!({ "seed": n }),
            )
            .await?;
        ids.push(run.id);
    }
    tracing::info!(
        runs = ids.len(),
        capacity = host.engine().scheduler().capacity(),
        "simulation started"
    );

    let finished = host.follow(&ids, format).await?;
    let stats = RunStatistics::from_runs(&finished);
    println!(
        "Simulated {} run(s): {} completed, {} failed, {} cancelled",
        stats.total, stats.completed, stats.failed, stats.cancelled
    );
    Ok(())
}
