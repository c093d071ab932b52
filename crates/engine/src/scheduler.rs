// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission scheduler
//!
//! Bounds the number of executing runs. Queued runs are admitted in FIFO
//! order whenever a slot is free; a slot frees when its run becomes
//! terminal.

use crate::error::EngineError;
use crate::machine::{Outcome, RunMachine};
use kiln_adapters::StageDispatcher;
use kiln_core::{Clock, Run, RunId, RunInput};
use kiln_storage::{RunFilter, RunStore};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// What `recover` found in the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recovery {
    /// Admitted, unfinished runs handed back to the executor
    pub resumed: Vec<RunId>,
    /// Pending runs that were missing from the admission queue
    pub requeued: Vec<RunId>,
    /// Runs dispatched by the pump that followed
    pub started: Vec<RunId>,
}

pub struct AdmissionScheduler {
    capacity: usize,
    in_flight: AtomicUsize,
    /// Runs currently holding a slot
    admitted: Mutex<HashSet<RunId>>,
    /// Admitted runs from a previous process waiting for a slot
    resume: Mutex<VecDeque<RunId>>,
    /// Serializes queue draining so FIFO order holds across callers
    pumping: tokio::sync::Mutex<()>,
}

impl AdmissionScheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            in_flight: AtomicUsize::new(0),
            admitted: Mutex::new(HashSet::new()),
            resume: Mutex::new(VecDeque::new()),
            pumping: tokio::sync::Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently taken
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_admitted(&self, id: &RunId) -> bool {
        self.admitted().contains(id)
    }

    fn admitted(&self) -> MutexGuard<'_, HashSet<RunId>> {
        self.admitted.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn try_acquire(&self) -> bool {
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return false;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn give_back(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    /// Free the slot held by a run; false if it held none
    pub fn release(&self, id: &RunId) -> bool {
        if self.admitted().remove(id) {
            self.give_back();
            tracing::debug!(run_id = %id, in_flight = self.in_flight(), "slot released");
            true
        } else {
            false
        }
    }

    /// Add a stored run to the admission queue
    pub async fn submit<S: RunStore, C: Clock>(
        &self,
        machine: &RunMachine<S, C>,
        id: &RunId,
    ) -> Result<(), EngineError> {
        machine.store().enqueue(id).await?;
        tracing::debug!(run_id = %id, "run queued");
        Ok(())
    }

    /// Admit and dispatch queued runs while slots are free
    ///
    /// Returns the runs that were dispatched.
    pub async fn pump<S, C, D>(
        &self,
        machine: &RunMachine<S, C>,
        dispatcher: &D,
    ) -> Result<Vec<RunId>, EngineError>
    where
        S: RunStore,
        C: Clock,
        D: StageDispatcher,
    {
        let _pumping = self.pumping.lock().await;
        let mut started = Vec::new();

        while self.try_acquire() {
            let run = match self.next_admission(machine).await {
                Ok(Some(run)) => run,
                Ok(None) => {
                    self.give_back();
                    break;
                }
                Err(e) => {
                    self.give_back();
                    return Err(e);
                }
            };

            if self.dispatch(machine, dispatcher, &run).await {
                started.push(run.id);
            }
        }

        Ok(started)
    }

    /// Pick the next run to occupy an already acquired slot
    async fn next_admission<S: RunStore, C: Clock>(
        &self,
        machine: &RunMachine<S, C>,
    ) -> Result<Option<Run>, EngineError> {
        loop {
            let resumed = self
                .resume
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            if let Some(id) = resumed {
                let run = machine.store().load(&id).await?;
                if !run.is_terminal() && self.admitted().insert(id) {
                    return Ok(Some(run));
                }
                continue;
            }

            let Some(id) = machine.store().dequeue().await? else {
                return Ok(None);
            };
            if !self.admitted().insert(id.clone()) {
                continue;
            }

            match machine.apply(&id, RunInput::Admit).await {
                Ok(Outcome::Applied { run, .. }) => {
                    tracing::info!(run_id = %id, in_flight = self.in_flight(), "run admitted");
                    return Ok(Some(run));
                }
                Ok(Outcome::Ignored(_)) => {
                    self.admitted().remove(&id);
                    tracing::debug!(run_id = %id, "skipping run admitted earlier");
                }
                Err(e) if e.is_benign() => {
                    self.admitted().remove(&id);
                    tracing::debug!(run_id = %id, error = %e, "skipping queued run");
                }
                Err(EngineError::RunNotFound(_)) => {
                    self.admitted().remove(&id);
                    tracing::warn!(run_id = %id, "queued run has no record");
                }
                Err(e) => {
                    self.admitted().remove(&id);
                    // Put it back so a later pump can retry the admission
                    if let Err(requeue) = machine.store().enqueue(&id).await {
                        tracing::error!(run_id = %id, error = %requeue, "failed to requeue run");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Hand a run to the executor; a failed dispatch fails the run
    async fn dispatch<S, C, D>(&self, machine: &RunMachine<S, C>, dispatcher: &D, run: &Run) -> bool
    where
        S: RunStore,
        C: Clock,
        D: StageDispatcher,
    {
        let Err(e) = dispatcher.dispatch(run).await else {
            return true;
        };

        tracing::error!(run_id = %run.id, error = %e, "dispatch failed, failing run");
        let reason = format!("dispatch failed: {}", e);
        match machine.apply(&run.id, RunInput::Fail { reason }).await {
            Ok(_) => {}
            Err(e) if e.is_benign() => {}
            Err(e) => tracing::error!(run_id = %run.id, error = %e, "failed to record dispatch failure"),
        }
        self.release(&run.id);
        false
    }

    /// Re-attach work left by a previous process, then pump
    pub async fn recover<S, C, D>(
        &self,
        machine: &RunMachine<S, C>,
        dispatcher: &D,
    ) -> Result<Recovery, EngineError>
    where
        S: RunStore,
        C: Clock,
        D: StageDispatcher,
    {
        let queued: HashSet<RunId> = machine.store().queued().await?.into_iter().collect();
        let mut runs = machine.store().list(&RunFilter::default()).await?;
        runs.retain(|r| !r.is_terminal());
        runs.sort_by(|a, b| {
            a.admitted_at
                .cmp(&b.admitted_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut recovery = Recovery::default();
        for run in &runs {
            if run.admitted_at.is_some() {
                if self.is_admitted(&run.id) {
                    continue;
                }
                tracing::warn!(run_id = %run.id, status = %run.status, "resuming interrupted run");
                self.resume
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push_back(run.id.clone());
                recovery.resumed.push(run.id.clone());
            } else if !queued.contains(&run.id) {
                tracing::warn!(run_id = %run.id, "requeueing pending run missing from queue");
                machine.store().enqueue(&run.id).await?;
                recovery.requeued.push(run.id.clone());
            }
        }

        recovery.started = self.pump(machine, dispatcher).await?;
        Ok(recovery)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
