// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::store::StoreError;
use kiln_core::{Operation, Run, RunId};
use std::collections::{HashMap, VecDeque};

/// Run records and the admission queue, rebuilt by applying operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub runs: HashMap<RunId, Run>,
    pub queue: VecDeque<RunId>,
}

impl MaterializedState {
    /// Rebuild state from a replayed log
    pub fn from_ops(ops: &[Operation]) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Get a run by id or unique prefix (like git commit hashes)
    pub fn get_run(&self, id: &str) -> Option<&Run> {
        if let Some(run) = self.runs.get(id) {
            return Some(run);
        }

        let mut matches = self.runs.iter().filter(|(k, _)| k.as_str().starts_with(id));
        match (matches.next(), matches.next()) {
            (Some((_, run)), None) => Some(run),
            _ => None,
        }
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::RunStored { run } => {
                self.runs.insert(run.id.clone(), (**run).clone());
            }

            Operation::Enqueued { run_id } => {
                if !self.queue.contains(run_id) {
                    self.queue.push_back(run_id.clone());
                }
            }

            Operation::Dequeued { run_id } => {
                self.queue.retain(|id| id != run_id);
            }
        }
    }

    /// Validate an insert and produce its operation
    pub fn insert_op(&self, run: &Run) -> Result<Operation, StoreError> {
        if self.runs.contains_key(&run.id) {
            return Err(StoreError::AlreadyExists(run.id.clone()));
        }
        Ok(Operation::RunStored {
            run: Box::new(run.clone()),
        })
    }

    /// Validate a compare-and-store write and produce its operation
    pub fn store_op(&self, run: &Run, expected_version: u64) -> Result<Operation, StoreError> {
        let current = self
            .runs
            .get(&run.id)
            .ok_or_else(|| StoreError::NotFound(run.id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                run_id: run.id.clone(),
                expected: expected_version,
                actual: current.version,
            });
        }
        Ok(Operation::RunStored {
            run: Box::new(run.clone()),
        })
    }

    /// Validate an enqueue; `None` when the run is already queued
    pub fn enqueue_op(&self, id: &RunId) -> Result<Option<Operation>, StoreError> {
        if !self.runs.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        if self.queue.contains(id) {
            return Ok(None);
        }
        Ok(Some(Operation::Enqueued { run_id: id.clone() }))
    }

    /// The operation removing the queue head, if any
    pub fn dequeue_op(&self) -> Option<Operation> {
        self.queue
            .front()
            .map(|id| Operation::Dequeued { run_id: id.clone() })
    }

    pub fn load(&self, id: &RunId) -> Result<Run, StoreError> {
        self.runs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
