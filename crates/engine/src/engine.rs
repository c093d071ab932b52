// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine facade
//!
//! Wires the run machine, admission scheduler and progress broadcaster
//! together and executes the effects transitions request.

use crate::broadcast::{Observer, ProgressBroadcaster, Subscription};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::machine::{Outcome, RunMachine};
use crate::scheduler::{AdmissionScheduler, Recovery};
use kiln_adapters::{PromptDirectory, StageDispatcher};
use kiln_core::{
    Clock, Effect, IdGen, PromptId, Run, RunId, RunInput, RunStatistics, RunStatus, StageReport,
    TracedEffect, UserId,
};
use kiln_storage::{RunFilter, RunStore};
use tracing::Instrument;

/// Engine collaborator dependencies
pub struct EngineDeps<S, P, D> {
    pub store: S,
    pub prompts: P,
    pub dispatcher: D,
}

/// Generation-run engine
pub struct Engine<S, P, D, C, I> {
    machine: RunMachine<S, C>,
    scheduler: AdmissionScheduler,
    broadcaster: ProgressBroadcaster,
    prompts: P,
    dispatcher: D,
    id_gen: I,
}

impl<S, P, D, C, I> Engine<S, P, D, C, I>
where
    S: RunStore,
    P: PromptDirectory,
    D: StageDispatcher,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        deps: EngineDeps<S, P, D>,
        config: &EngineConfig,
        clock: C,
        id_gen: I,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let broadcaster = ProgressBroadcaster::new();
        Ok(Self {
            machine: RunMachine::new(
                deps.store,
                clock,
                broadcaster.clone(),
                config.max_conflict_retries,
            ),
            scheduler: AdmissionScheduler::new(config.capacity),
            broadcaster,
            prompts: deps.prompts,
            dispatcher: deps.dispatcher,
            id_gen,
        })
    }

    pub fn scheduler(&self) -> &AdmissionScheduler {
        &self.scheduler
    }

    pub fn broadcaster(&self) -> &ProgressBroadcaster {
        &self.broadcaster
    }

    /// Create a run for a prompt the user owns and queue it for admission
    pub async fn create(
        &self,
        user_id: UserId,
        prompt_id: PromptId,
        parameters: serde_json::Value,
    ) -> Result<Run, EngineError> {
        self.create_run(user_id, prompt_id, parameters, None).await
    }

    async fn create_run(
        &self,
        user_id: UserId,
        prompt_id: PromptId,
        parameters: serde_json::Value,
        retry_of: Option<RunId>,
    ) -> Result<Run, EngineError> {
        if !self.prompts.prompt_exists(&prompt_id, &user_id).await? {
            return Err(EngineError::InvalidReference { prompt_id, user_id });
        }

        let mut run = Run::new(
            self.id_gen.next(),
            user_id,
            prompt_id,
            parameters,
            self.machine.clock(),
        );
        if let Some(original) = retry_of {
            run = run.with_retry_of(original);
        }

        let run = self.machine.insert(run).await?;
        self.scheduler.submit(&self.machine, &run.id).await?;
        self.pump().await;
        self.get(&run.id).await
    }

    /// Apply a stage executor's progress report
    pub async fn advance(&self, run_id: &RunId, report: StageReport) -> Result<Run, EngineError> {
        let stage = report.stage;
        match self.machine.apply(run_id, RunInput::Report(report)).await {
            Ok(outcome) => Ok(self.finish(outcome).await),
            Err(e) => {
                if e.is_benign() {
                    tracing::debug!(%run_id, %stage, error = %e, "discarding report");
                }
                Err(e)
            }
        }
    }

    /// Cancel a run that has not finished
    pub async fn cancel(&self, run_id: &RunId) -> Result<Run, EngineError> {
        let outcome = self.machine.apply(run_id, RunInput::Cancel).await?;
        Ok(self.finish(outcome).await)
    }

    /// Start a new run from a failed one
    ///
    /// Parameters are copied from the original unless `parameters` is given.
    pub async fn retry(
        &self,
        run_id: &RunId,
        parameters: Option<serde_json::Value>,
    ) -> Result<Run, EngineError> {
        let original = self.get(run_id).await?;
        if original.status != RunStatus::Failed {
            return Err(EngineError::InvalidState {
                run_id: original.id,
                status: original.status,
                operation: "retry",
            });
        }

        let parameters = parameters.unwrap_or_else(|| original.parameters.clone());
        let run = self
            .create_run(
                original.user_id,
                original.prompt_id,
                parameters,
                Some(original.id.clone()),
            )
            .await?;
        tracing::info!(run_id = %run.id, retry_of = %original.id, "run retried");
        Ok(run)
    }

    pub async fn get(&self, run_id: &RunId) -> Result<Run, EngineError> {
        Ok(self.machine.store().load(run_id).await?)
    }

    pub async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, EngineError> {
        Ok(self.machine.store().list(filter).await?)
    }

    /// Outcome counts across a user's runs
    pub async fn statistics(&self, user_id: &UserId) -> Result<RunStatistics, EngineError> {
        let runs = self.list(&RunFilter::for_user(user_id.clone())).await?;
        Ok(RunStatistics::from_runs(&runs))
    }

    /// Observe a run: a snapshot first, then every later transition
    pub async fn subscribe(
        &self,
        run_id: &RunId,
        observer: impl Observer,
    ) -> Result<Subscription, EngineError> {
        self.machine.subscribe(run_id, observer).await
    }

    /// Reattach work persisted by a previous process
    pub async fn recover(&self) -> Result<Recovery, EngineError> {
        let recovery = self
            .scheduler
            .recover(&self.machine, &self.dispatcher)
            .await?;
        tracing::info!(
            resumed = recovery.resumed.len(),
            requeued = recovery.requeued.len(),
            started = recovery.started.len(),
            "recovery complete"
        );
        Ok(recovery)
    }

    /// Admit queued runs into free slots
    async fn pump(&self) {
        if let Err(e) = self.scheduler.pump(&self.machine, &self.dispatcher).await {
            tracing::error!(error = %e, "admission failed");
        }
    }

    async fn finish(&self, outcome: Outcome) -> Run {
        match outcome {
            Outcome::Applied { run, effects } => {
                for effect in effects {
                    self.execute(effect).await;
                }
                run
            }
            Outcome::Ignored(run) => run,
        }
    }

    /// Execute a single effect with tracing
    ///
    /// The transition is already durable, so failures are logged rather
    /// than returned.
    async fn execute(&self, effect: Effect) {
        let span = tracing::info_span!("effect", effect = effect.name());
        async move {
            tracing::debug!(fields = ?effect.fields(), "executing");
            match effect {
                // Emits are published by the machine at commit time
                Effect::Emit(_) => {}
                Effect::SignalCancel { run_id } => {
                    if let Err(e) = self.dispatcher.cancel(&run_id).await {
                        tracing::warn!(%run_id, error = %e, "cancel signal not delivered");
                    }
                }
                Effect::ReleaseSlot { run_id } => {
                    if self.scheduler.release(&run_id) {
                        self.pump().await;
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
