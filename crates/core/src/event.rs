// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition events delivered to progress observers

use crate::id::RunId;
use crate::run::Run;
use crate::stage::StageId;
use crate::status::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed run transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: RunId,
    /// Record version written by this transition
    pub version: u64,
    pub previous: RunStatus,
    pub status: RunStatus,
    pub progress: f64,
    pub current_stage: Option<StageId>,
    pub error: Option<String>,
    pub estimated_time_remaining_secs: Option<f64>,
    pub at: DateTime<Utc>,
}

impl RunEvent {
    /// Describe the transition from `previous` to the state of `run`
    pub fn between(previous: RunStatus, run: &Run) -> Self {
        Self {
            run_id: run.id.clone(),
            version: run.version,
            previous,
            status: run.status,
            progress: run.progress,
            current_stage: run.current_stage,
            error: run.error.clone(),
            estimated_time_remaining_secs: run.estimated_time_remaining_secs,
            at: run.updated_at,
        }
    }

    /// Event name for log fields (e.g. "run:qa_safety")
    pub fn name(&self) -> String {
        format!("run:{}", self.status)
    }
}

/// What an observer receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// Full state of the run at subscription time
    Snapshot { run: Box<Run> },
    /// A transition committed after the subscription was established
    Transition { event: RunEvent },
}

impl ProgressUpdate {
    pub fn run_id(&self) -> &RunId {
        match self {
            ProgressUpdate::Snapshot { run } => &run.id,
            ProgressUpdate::Transition { event } => &event.run_id,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            ProgressUpdate::Snapshot { run } => run.version,
            ProgressUpdate::Transition { event } => event.version,
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            ProgressUpdate::Snapshot { run } => run.status,
            ProgressUpdate::Transition { event } => event.status,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
