// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use kiln_core::{ProgressUpdate, Run, RunStatistics};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// Print one progress update as a line (text) or a JSON object per line
pub fn print_update(update: &ProgressUpdate, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", UpdateLine(update)),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(update) {
                println!("{}", json);
            }
        }
    }
}

fn percent(progress: f64) -> String {
    format!("{:.0}%", progress * 100.0)
}

struct UpdateLine<'a>(&'a ProgressUpdate);

impl fmt::Display for UpdateLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (run_id, status, progress, eta, error) = match self.0 {
            ProgressUpdate::Snapshot { run } => (
                &run.id,
                run.status,
                run.progress,
                run.estimated_time_remaining_secs,
                run.error.as_deref(),
            ),
            ProgressUpdate::Transition { event } => (
                &event.run_id,
                event.status,
                event.progress,
                event.estimated_time_remaining_secs,
                event.error.as_deref(),
            ),
        };
        write!(f, "{:<12} {:<13} {:>4}", run_id, status, percent(progress))?;
        if let Some(eta) = eta.filter(|_| !status.is_terminal()) {
            write!(f, "  eta {:.0}s", eta)?;
        }
        if let Some(error) = error {
            write!(f, "  {}", error)?;
        }
        Ok(())
    }
}

/// Header matching [`RunRow`] columns
pub const RUN_HEADER: &str = "ID           STATUS        PROGRESS  USER         PROMPT";

/// One row of `kiln runs list`
#[derive(Serialize)]
#[serde(transparent)]
pub struct RunRow<'a>(pub &'a Run);

impl fmt::Display for RunRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        write!(
            f,
            "{:<12} {:<13} {:>8}  {:<12} {}",
            truncate(run.id.as_str(), 12),
            run.status,
            percent(run.progress),
            truncate(run.user_id.as_str(), 12),
            run.prompt_id
        )
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Full detail of `kiln runs show`
#[derive(Serialize)]
#[serde(transparent)]
pub struct RunDetail<'a>(pub &'a Run);

impl fmt::Display for RunDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        writeln!(f, "Run: {}", run.id)?;
        writeln!(f, "  Prompt: {}", run.prompt_id)?;
        writeln!(f, "  User: {}", run.user_id)?;
        writeln!(f, "  Status: {} ({})", run.status, percent(run.progress))?;
        if let Some(stage) = run.current_stage {
            writeln!(f, "  Stage: {}", stage)?;
        }
        if let Some(error) = &run.error {
            writeln!(f, "  Error: {}", error)?;
        }
        if let Some(original) = &run.retry_of {
            writeln!(f, "  Retry of: {}", original)?;
        }
        writeln!(f, "  Created: {}", run.created_at)?;
        if let Some(completed) = run.completed_at {
            writeln!(f, "  Completed: {}", completed)?;
        }
        write!(f, "  Stages:")?;
        for stage in &run.stages {
            write!(
                f,
                "\n    {:<13} {:<10} {:>4}",
                stage.id,
                stage.status,
                percent(stage.progress)
            )?;
        }
        Ok(())
    }
}

/// Output of `kiln stats`
#[derive(Serialize)]
#[serde(transparent)]
pub struct StatsView(pub RunStatistics);

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.0;
        writeln!(f, "Runs: {}", stats.total)?;
        writeln!(f, "  Pending: {}", stats.pending)?;
        writeln!(f, "  Active: {}", stats.active)?;
        writeln!(f, "  Completed: {}", stats.completed)?;
        writeln!(f, "  Failed: {}", stats.failed)?;
        writeln!(f, "  Cancelled: {}", stats.cancelled)?;
        write!(f, "Success rate: {:.1}%", stats.success_rate)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
