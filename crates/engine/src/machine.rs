// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic run updates
//!
//! One writer per run: each update holds the run's lock across load,
//! transition, compare-and-store and publication, so observers see events in
//! commit order. Subscriptions take the same lock. Version conflicts from
//! other writers are retried.

use crate::broadcast::{Observer, ProgressBroadcaster, Subscription};
use crate::error::EngineError;
use kiln_core::{
    Clock, Effect, Run, RunEvent, RunId, RunInput, RunStatus, StaleReason, Transition,
};
use kiln_storage::{RunStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Result of an accepted update
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Stored and published; `effects` are what remains to execute
    Applied { run: Run, effects: Vec<Effect> },
    /// Accepted without change; carries the current record
    Ignored(Run),
}

impl Outcome {
    pub fn run(&self) -> &Run {
        match self {
            Outcome::Applied { run, .. } | Outcome::Ignored(run) => run,
        }
    }

    pub fn into_run(self) -> Run {
        match self {
            Outcome::Applied { run, .. } | Outcome::Ignored(run) => run,
        }
    }
}

/// Drives run records through `Run::transition` against a store
pub struct RunMachine<S, C> {
    store: S,
    clock: C,
    broadcaster: ProgressBroadcaster,
    max_conflict_retries: u32,
    locks: Mutex<HashMap<RunId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: RunStore, C: Clock> RunMachine<S, C> {
    pub fn new(
        store: S,
        clock: C,
        broadcaster: ProgressBroadcaster,
        max_conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            clock,
            broadcaster,
            max_conflict_retries,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Store a freshly created run and announce it
    pub async fn insert(&self, run: Run) -> Result<Run, EngineError> {
        self.store.insert(&run).await?;
        self.emit(&run, RunEvent::between(RunStatus::Pending, &run));
        Ok(run)
    }

    /// Apply one input to a run atomically
    pub async fn apply(&self, id: &RunId, input: RunInput) -> Result<Outcome, EngineError> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_locked(id, input).await
        };
        let settled = match &result {
            Ok(outcome) => outcome.run().is_terminal(),
            Err(e) => is_settled(e),
        };
        if settled {
            self.forget(id, lock);
        }
        result
    }

    /// Register an observer under the run's lock
    ///
    /// No transition can commit between the store read and the
    /// registration, so the snapshot is never older than the next event.
    pub async fn subscribe(
        &self,
        id: &RunId,
        observer: impl Observer,
    ) -> Result<Subscription, EngineError> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            match self.store.load(id).await {
                Ok(stored) => self
                    .broadcaster
                    .subscribe_from(&stored, observer)
                    .map(|subscription| (subscription, stored.is_terminal())),
                Err(e) => Err(e.into()),
            }
        };
        let settled = match &result {
            Ok((_, terminal)) => *terminal,
            Err(e) => is_settled(e),
        };
        if settled {
            self.forget(id, lock);
        }
        result.map(|(subscription, _)| subscription)
    }

    async fn apply_locked(&self, id: &RunId, input: RunInput) -> Result<Outcome, EngineError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let current = self.store.load(id).await?;
            let (next, effects) = match current.transition(input.clone(), &self.clock)? {
                Transition::Ignored => return Ok(Outcome::Ignored(current)),
                Transition::Applied { run, effects } => (*run, effects),
            };

            match self.store.store(&next, current.version).await {
                Ok(()) => {}
                Err(StoreError::Conflict {
                    expected, actual, ..
                }) if attempts <= self.max_conflict_retries => {
                    tracing::debug!(run_id = %id, attempts, expected, actual, "version conflict, retrying");
                    continue;
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::warn!(run_id = %id, attempts, "giving up after repeated version conflicts");
                    return Err(EngineError::PersistenceConflict {
                        run_id: id.clone(),
                        attempts,
                    });
                }
                Err(e) => return Err(e.into()),
            }

            let mut remaining = Vec::new();
            for effect in effects {
                match effect {
                    Effect::Emit(event) => self.emit(&next, event),
                    other => remaining.push(other),
                }
            }
            return Ok(Outcome::Applied {
                run: next,
                effects: remaining,
            });
        }
    }

    fn emit(&self, run: &Run, event: RunEvent) {
        if event.previous != event.status || event.version == 1 {
            tracing::info!(
                run_id = %event.run_id,
                from = %event.previous,
                to = %event.status,
                version = event.version,
                "run transitioned"
            );
        } else {
            tracing::debug!(
                run_id = %event.run_id,
                status = %event.status,
                progress = event.progress,
                version = event.version,
                "run progressed"
            );
        }
        self.broadcaster.publish(run, event);
    }

    fn lock_for(&self, id: &RunId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Drop the lock of a run that accepts no more writes
    ///
    /// Kept while another caller still holds or waits on it.
    fn forget(&self, id: &RunId, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let unused = locks
            .get(id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if unused {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Errors after which the run can never be written again
fn is_settled(e: &EngineError) -> bool {
    matches!(
        e,
        EngineError::AlreadyTerminal { .. }
            | EngineError::RunNotFound(_)
            | EngineError::StaleUpdate {
                reason: StaleReason::Terminal(_),
                ..
            }
    )
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
