// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory run store

use crate::filter::RunFilter;
use crate::state::MaterializedState;
use crate::store::{RunStore, StoreError};
use async_trait::async_trait;
use kiln_core::{Run, RunId};
use std::sync::{Arc, Mutex, MutexGuard};

/// Volatile run store; state is lost when the process exits
#[derive(Clone, Default)]
pub struct MemoryRunStore {
    state: Arc<Mutex<MaterializedState>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MaterializedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn insert(&self, run: &Run) -> Result<(), StoreError> {
        let mut state = self.state();
        let op = state.insert_op(run)?;
        state.apply(&op);
        Ok(())
    }

    async fn load(&self, id: &RunId) -> Result<Run, StoreError> {
        self.state().load(id)
    }

    async fn store(&self, run: &Run, expected_version: u64) -> Result<(), StoreError> {
        let mut state = self.state();
        let op = state.store_op(run, expected_version)?;
        state.apply(&op);
        Ok(())
    }

    async fn enqueue(&self, id: &RunId) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(op) = state.enqueue_op(id)? {
            state.apply(&op);
        }
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<RunId>, StoreError> {
        let mut state = self.state();
        let Some(op) = state.dequeue_op() else {
            return Ok(None);
        };
        state.apply(&op);
        Ok(Some(op.run_id().clone()))
    }

    async fn queued(&self) -> Result<Vec<RunId>, StoreError> {
        Ok(self.state().queue.iter().cloned().collect())
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError> {
        Ok(filter.apply(self.state().runs.values()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
