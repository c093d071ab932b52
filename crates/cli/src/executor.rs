// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated stage executor
//!
//! Consumes dispatch messages and drives each run through the remaining
//! stages with timed progress reports. A cancel signal aborts the run's
//! task; a rejected report or a terminal run ends it.

use crate::config::ExecutorConfig;
use kiln_adapters::{DispatchMessage, PromptDirectory, StageDispatcher};
use kiln_core::{Clock, IdGen, Run, RunId, StageId, StageReport, StageStatus, CATALOG};
use kiln_engine::Engine;
use kiln_storage::RunStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct SimulatedExecutor<S, P, D, C, I> {
    engine: Arc<Engine<S, P, D, C, I>>,
    config: ExecutorConfig,
    tasks: HashMap<RunId, JoinHandle<()>>,
}

impl<S, P, D, C, I> SimulatedExecutor<S, P, D, C, I>
where
    S: RunStore,
    P: PromptDirectory,
    D: StageDispatcher,
    C: Clock,
    I: IdGen,
{
    pub fn new(engine: Arc<Engine<S, P, D, C, I>>, config: ExecutorConfig) -> Self {
        Self {
            engine,
            config,
            tasks: HashMap::new(),
        }
    }

    /// Process messages until every dispatcher handle is dropped
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<DispatchMessage>) {
        while let Some(message) = rx.recv().await {
            self.handle(message);
        }
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }

    fn handle(&mut self, message: DispatchMessage) {
        self.tasks.retain(|_, task| !task.is_finished());
        match message {
            DispatchMessage::Dispatch(run) => {
                let run_id = run.id.clone();
                let task = tokio::spawn(drive(
                    Arc::clone(&self.engine),
                    *run,
                    self.config.clone(),
                ));
                if let Some(previous) = self.tasks.insert(run_id, task) {
                    previous.abort();
                }
            }
            DispatchMessage::Cancel(run_id) => {
                if let Some(task) = self.tasks.remove(&run_id) {
                    tracing::debug!(%run_id, "stopping simulated work");
                    task.abort();
                }
            }
        }
    }
}

/// The reports one stage emits, resuming after `done` progress
fn stage_reports(stage: StageId, done: f64, config: &ExecutorConfig) -> Vec<StageReport> {
    let ticks = config.ticks_per_stage.max(1);
    (1..=ticks)
        .filter_map(|tick| {
            let progress = f64::from(tick) / f64::from(ticks);
            if tick < ticks {
                return (progress > done).then(|| StageReport::running(stage, progress));
            }
            if config.fail_stage == Some(stage) {
                let before = f64::from(ticks - 1) / f64::from(ticks);
                return Some(StageReport::failed(
                    stage,
                    before.max(done),
                    format!("simulated failure in {stage}"),
                ));
            }
            Some(StageReport::completed(
                stage,
                Some(serde_json::json!({ "artifact": format!("{stage}.bin") })),
            ))
        })
        .collect()
}

/// Resume from the stage the run expects next and the progress it recorded
fn remaining_reports(run: &Run, config: &ExecutorConfig) -> Vec<StageReport> {
    let expected = run.expected_stage();
    CATALOG
        .iter()
        .skip_while(|def| def.id != expected)
        .flat_map(|def| {
            let done = run
                .stage(def.id)
                .filter(|s| s.status == StageStatus::Running)
                .map_or(0.0, |s| s.progress);
            stage_reports(def.id, done, config)
        })
        .collect()
}

async fn drive<S, P, D, C, I>(
    engine: Arc<Engine<S, P, D, C, I>>,
    run: Run,
    config: ExecutorConfig,
) where
    S: RunStore,
    P: PromptDirectory,
    D: StageDispatcher,
    C: Clock,
    I: IdGen,
{
    tracing::debug!(run_id = %run.id, stage = %run.expected_stage(), "simulating");
    for report in remaining_reports(&run, &config) {
        tokio::time::sleep(config.tick).await;
        match engine.advance(&run.id, report).await {
            Ok(current) if current.is_terminal() => return,
            Ok(_) => {}
            Err(e) => {
                if !e.is_benign() {
                    tracing::warn!(run_id = %run.id, error = %e, "report rejected");
                }
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
