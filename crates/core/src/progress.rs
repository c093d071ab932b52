// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress aggregation
//!
//! A run's status and progress are never stored independently: both are
//! recomputed from the stage records after every stage report.

use crate::stage::{StageId, StageRecord, StageStatus};
use crate::status::RunStatus;

/// Run-level view derived from the stage records
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub status: RunStatus,
    pub progress: f64,
    /// Earliest failed stage, for error attribution
    pub failed_stage: Option<StageId>,
}

/// Compute the run-level status and progress from the stage records
pub fn aggregate(stages: &[StageRecord]) -> Aggregate {
    if stages.is_empty() {
        return Aggregate {
            status: RunStatus::Pending,
            progress: 0.0,
            failed_stage: None,
        };
    }

    let completed = stages
        .iter()
        .filter(|s| s.status == StageStatus::Completed)
        .count();
    let running = stages
        .iter()
        .find(|s| s.status == StageStatus::Running)
        .map(|s| s.progress.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let progress = ((completed as f64 + running) / stages.len() as f64).clamp(0.0, 1.0);

    let failed_stage = stages
        .iter()
        .find(|s| s.status == StageStatus::Failed)
        .map(|s| s.id);

    let status = if failed_stage.is_some() {
        RunStatus::Failed
    } else if completed == stages.len() {
        RunStatus::Completed
    } else if stages.iter().all(|s| s.status == StageStatus::Pending) {
        RunStatus::Pending
    } else {
        stages
            .iter()
            .find(|s| s.status != StageStatus::Completed)
            .map(|s| RunStatus::for_stage(s.id))
            .unwrap_or(RunStatus::Completed)
    };

    Aggregate {
        status,
        progress,
        failed_stage,
    }
}

/// Advisory estimate of the seconds left, weighted by nominal stage durations
pub fn estimate_remaining(stages: &[StageRecord]) -> f64 {
    stages
        .iter()
        .map(|s| {
            let nominal = f64::from(s.id.def().nominal_secs);
            match s.status {
                StageStatus::Completed => 0.0,
                StageStatus::Running => nominal * (1.0 - s.progress.clamp(0.0, 1.0)),
                StageStatus::Pending | StageStatus::Failed => nominal,
            }
        })
        .sum()
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
