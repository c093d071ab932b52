// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run state machine
//!
//! A run is one end-to-end attempt to generate an asset from a prompt. It
//! walks the stage catalog strictly in order. `transition` is pure: it returns
//! the next record (with its version bumped) plus the effects the engine must
//! execute once that record is durably stored.

use crate::clock::Clock;
use crate::effect::Effect;
use crate::event::RunEvent;
use crate::id::{PromptId, RunId, UserId};
use crate::progress::{aggregate, estimate_remaining};
use crate::stage::{self, StageId, StageRecord, StageStatus, CATALOG};
use crate::status::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub prompt_id: PromptId,
    pub user_id: UserId,
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub status: RunStatus,
    pub progress: f64,
    pub current_stage: Option<StageId>,
    pub stages: Vec<StageRecord>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub estimated_time_remaining_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub admitted_at: Option<DateTime<Utc>>,
    pub retry_of: Option<RunId>,
    /// Incremented by every durable write
    pub version: u64,
}

/// A progress report from a stage executor
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: StageId,
    pub progress: f64,
    pub status: StageStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl StageReport {
    pub fn running(stage: StageId, progress: f64) -> Self {
        Self {
            stage,
            progress,
            status: StageStatus::Running,
            output: None,
            error: None,
        }
    }

    pub fn completed(stage: StageId, output: Option<serde_json::Value>) -> Self {
        Self {
            stage,
            progress: 1.0,
            status: StageStatus::Completed,
            output,
            error: None,
        }
    }

    pub fn failed(stage: StageId, progress: f64, error: impl Into<String>) -> Self {
        Self {
            stage,
            progress,
            status: StageStatus::Failed,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Inputs that can change run state
#[derive(Debug, Clone, PartialEq)]
pub enum RunInput {
    /// The admission scheduler granted an execution slot
    Admit,
    /// A stage executor reported progress
    Report(StageReport),
    /// Cooperative cancellation
    Cancel,
    /// Engine-side failure outside any stage report (e.g. dispatch failed)
    Fail { reason: String },
}

/// Outcome of a transition that was not rejected
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The run changed; store `run` then execute `effects`
    Applied { run: Box<Run>, effects: Vec<Effect> },
    /// Accepted but without any state change
    Ignored,
}

/// Why a stage report was discarded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StaleReason {
    #[error("run has not been admitted")]
    NotAdmitted,
    #[error("run is already {0}")]
    Terminal(RunStatus),
    #[error("expected stage {expected}, got {got}")]
    WrongStage { expected: StageId, got: StageId },
    #[error("progress went backwards ({reported} < {recorded})")]
    Regressed { recorded: f64, reported: f64 },
    #[error("duplicate report at progress {0}")]
    Duplicate(f64),
    #[error("stage status cannot be reported as pending")]
    PendingStatus,
    #[error("progress is not a number")]
    InvalidProgress,
}

/// Rejected transitions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("run {run_id} is already terminal ({status})")]
    AlreadyTerminal { run_id: RunId, status: RunStatus },
    #[error("cannot {operation} run {run_id} in status {status}")]
    InvalidState {
        run_id: RunId,
        status: RunStatus,
        operation: &'static str,
    },
    #[error("stale update for run {run_id}: {reason}")]
    StaleUpdate { run_id: RunId, reason: StaleReason },
}

impl Run {
    /// Create a new run with every stage pending
    pub fn new(
        id: impl Into<RunId>,
        user_id: UserId,
        prompt_id: PromptId,
        parameters: serde_json::Value,
        clock: &impl Clock,
    ) -> Self {
        let now = clock.now();
        let stages = stage::materialize();
        let eta = estimate_remaining(&stages);
        Self {
            id: id.into(),
            prompt_id,
            user_id,
            parameters,
            status: RunStatus::Pending,
            progress: 0.0,
            current_stage: None,
            stages,
            result: None,
            error: None,
            estimated_time_remaining_secs: Some(eta),
            created_at: now,
            updated_at: now,
            completed_at: None,
            admitted_at: None,
            retry_of: None,
            version: 1,
        }
    }

    /// Mark this run as a retry of an earlier failed run
    pub fn with_retry_of(self, original: RunId) -> Self {
        Self {
            retry_of: Some(original),
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn stage(&self, id: StageId) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// The stage the next report must address
    pub fn expected_stage(&self) -> StageId {
        self.current_stage.unwrap_or(CATALOG[0].id)
    }

    /// Pure transition function - returns the next record and its effects
    pub fn transition(
        &self,
        input: RunInput,
        clock: &impl Clock,
    ) -> Result<Transition, TransitionError> {
        let now = clock.now();

        match input {
            RunInput::Admit => self.admit(now),
            RunInput::Report(report) => self.apply_report(report, now),
            RunInput::Cancel => self.cancel(now),
            RunInput::Fail { reason } => self.fail(reason, now),
        }
    }

    fn admit(&self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        if self.is_terminal() {
            return Err(self.already_terminal());
        }
        if self.admitted_at.is_some() {
            return Ok(Transition::Ignored);
        }

        let mut run = self.clone();
        run.admitted_at = Some(now);
        Ok(self.commit(run, now, Vec::new()))
    }

    fn apply_report(
        &self,
        report: StageReport,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionError> {
        // Late reports for a cancelled run are absorbed without error
        if self.status == RunStatus::Cancelled {
            return Ok(Transition::Ignored);
        }
        if self.is_terminal() {
            return Err(self.stale(StaleReason::Terminal(self.status)));
        }
        if self.admitted_at.is_none() {
            return Err(self.stale(StaleReason::NotAdmitted));
        }
        if report.progress.is_nan() {
            return Err(self.stale(StaleReason::InvalidProgress));
        }
        if report.status == StageStatus::Pending {
            return Err(self.stale(StaleReason::PendingStatus));
        }

        let expected = self.expected_stage();
        if report.stage != expected {
            return Err(self.stale(StaleReason::WrongStage {
                expected,
                got: report.stage,
            }));
        }

        let Some(index) = self.stages.iter().position(|s| s.id == report.stage) else {
            return Err(self.stale(StaleReason::WrongStage {
                expected,
                got: report.stage,
            }));
        };

        let reported = report.progress.clamp(0.0, 1.0);
        let recorded = &self.stages[index];
        if recorded.status == StageStatus::Running {
            if reported < recorded.progress {
                return Err(self.stale(StaleReason::Regressed {
                    recorded: recorded.progress,
                    reported,
                }));
            }
            if report.status == StageStatus::Running && reported == recorded.progress {
                return Err(self.stale(StaleReason::Duplicate(reported)));
            }
        }

        let mut run = self.clone();
        let stage = &mut run.stages[index];
        if stage.status == StageStatus::Pending {
            stage.status = StageStatus::Running;
            stage.started_at = Some(now);
        }

        match report.status {
            StageStatus::Running => {
                stage.progress = reported;
                run.current_stage = Some(report.stage);
            }
            StageStatus::Completed => {
                stage.progress = 1.0;
                stage.status = StageStatus::Completed;
                stage.completed_at = Some(now);
                stage.output = report.output;
                run.current_stage = run.stages.get(index + 1).map(|s| s.id);
            }
            StageStatus::Failed => {
                stage.progress = reported;
                stage.status = StageStatus::Failed;
                stage.completed_at = Some(now);
                stage.output = report.output;
                stage.error = Some(
                    report
                        .error
                        .unwrap_or_else(|| format!("stage {} failed", report.stage)),
                );
                run.current_stage = None;
            }
            StageStatus::Pending => {}
        }

        Ok(self.settle(run, now))
    }

    fn cancel(&self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        if self.is_terminal() {
            return Err(self.already_terminal());
        }

        let mut run = self.clone();
        run.status = RunStatus::Cancelled;
        run.current_stage = None;
        run.completed_at = Some(now);
        run.estimated_time_remaining_secs = None;

        let mut effects = Vec::new();
        if self.admitted_at.is_some() {
            effects.push(Effect::SignalCancel {
                run_id: self.id.clone(),
            });
            effects.push(Effect::ReleaseSlot {
                run_id: self.id.clone(),
            });
        }
        Ok(self.commit(run, now, effects))
    }

    fn fail(&self, reason: String, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        if self.is_terminal() {
            return Err(self.already_terminal());
        }

        // Attribute the failure to the stage that would run next so the
        // aggregate stays the single source of the run status
        let expected = self.expected_stage();
        let mut run = self.clone();
        if let Some(stage) = run.stages.iter_mut().find(|s| s.id == expected) {
            if stage.status == StageStatus::Pending {
                stage.started_at = Some(now);
            }
            stage.status = StageStatus::Failed;
            stage.completed_at = Some(now);
            stage.error = Some(reason);
        }
        run.current_stage = None;

        Ok(self.settle(run, now))
    }

    /// Recompute status and progress from the stages and finish the record
    fn settle(&self, mut run: Run, now: DateTime<Utc>) -> Transition {
        let agg = aggregate(&run.stages);
        run.status = agg.status;
        run.progress = agg.progress;

        let mut effects = Vec::new();
        match agg.status {
            RunStatus::Completed => {
                run.current_stage = None;
                run.result = run.stages.last().and_then(|s| s.output.clone());
                run.estimated_time_remaining_secs = Some(0.0);
                run.completed_at.get_or_insert(now);
            }
            RunStatus::Failed => {
                run.error = agg
                    .failed_stage
                    .and_then(|id| run.stage(id))
                    .and_then(|s| s.error.clone());
                run.estimated_time_remaining_secs = None;
                run.completed_at.get_or_insert(now);
            }
            _ => {
                run.estimated_time_remaining_secs = Some(estimate_remaining(&run.stages));
            }
        }

        if run.status.is_terminal() {
            effects.push(Effect::ReleaseSlot {
                run_id: self.id.clone(),
            });
        }
        self.commit(run, now, effects)
    }

    /// Bump the version and prepend the transition event
    fn commit(&self, mut run: Run, now: DateTime<Utc>, mut effects: Vec<Effect>) -> Transition {
        run.updated_at = now;
        run.version = self.version + 1;
        effects.insert(0, Effect::Emit(RunEvent::between(self.status, &run)));
        Transition::Applied {
            run: Box::new(run),
            effects,
        }
    }

    fn stale(&self, reason: StaleReason) -> TransitionError {
        TransitionError::StaleUpdate {
            run_id: self.id.clone(),
            reason,
        }
    }

    fn already_terminal(&self) -> TransitionError {
        TransitionError::AlreadyTerminal {
            run_id: self.id.clone(),
            status: self.status,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
