// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kiln submit` and `kiln retry` - create a run and follow it

use super::{params_object, parse_param};
use crate::host::{DetachedHost, Host};
use crate::output::OutputFormat;
use anyhow::Result;
use clap::Args;
use kiln_adapters::StageDispatcher;
use kiln_core::{PromptId, Run, RunId, UserId};

#[derive(Args)]
pub struct SubmitArgs {
    /// Owner of the prompt
    #[arg(long)]
    pub user: String,

    /// Prompt to generate from
    #[arg(long)]
    pub prompt: String,

    /// Generation parameter (key=value, repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, serde_json::Value)>,

    /// Record the run and exit without executing it
    #[arg(long)]
    pub detach: bool,
}

#[derive(Args)]
pub struct RetryArgs {
    /// Failed run to retry (id or unique prefix)
    pub id: String,

    /// Replace the original parameters (key=value, repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, serde_json::Value)>,

    /// Record the run and exit without executing it
    #[arg(long)]
    pub detach: bool,
}

pub async fn submit(args: SubmitArgs, host: &mut Host, format: OutputFormat) -> Result<()> {
    host.start().await?;
    let run = create(args, host).await?;
    println!("Started: {}", run.id);
    follow(run, host, format).await
}

/// Record the run without executing it
pub async fn submit_detached(args: SubmitArgs, host: &DetachedHost) -> Result<()> {
    let run = create(args, host).await?;
    report_detached(&run);
    Ok(())
}

pub async fn retry(args: RetryArgs, host: &mut Host, format: OutputFormat) -> Result<()> {
    let original = host.require(&args.id)?;
    host.start().await?;
    let run = resubmit(&original, args, host).await?;
    println!("Started: {}", run.id);
    follow(run, host, format).await
}

pub async fn retry_detached(args: RetryArgs, host: &DetachedHost) -> Result<()> {
    let original = host.require(&args.id)?;
    let run = resubmit(&original, args, host).await?;
    report_detached(&run);
    Ok(())
}

async fn create<D: StageDispatcher>(args: SubmitArgs, host: &Host<D>) -> Result<Run> {
    Ok(host
        .engine()
        .create(
            UserId::from(args.user),
            PromptId::from(args.prompt),
            params_object(args.params),
        )
        .await?)
}

async fn resubmit<D: StageDispatcher>(
    original: &RunId,
    args: RetryArgs,
    host: &Host<D>,
) -> Result<Run> {
    let params = (!args.params.is_empty()).then(|| params_object(args.params));
    Ok(host.engine().retry(original, params).await?)
}

/// A detached run that got a free slot holds it until an executing
/// invocation picks the run up again.
fn report_detached(run: &Run) {
    println!("Submitted: {}", run.id);
    if run.admitted_at.is_some() {
        println!("Admitted, waiting for an executing kiln command");
    } else {
        println!("Queued, waiting for a free slot");
    }
}

async fn follow(run: Run, host: &Host, format: OutputFormat) -> Result<()> {
    for run in host.follow(&[run.id], format).await? {
        println!("Run {} {}", run.id, run.status);
    }
    Ok(())
}
