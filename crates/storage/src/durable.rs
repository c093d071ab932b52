// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed run store
//!
//! Writes append to the log and `sync_all` on a blocking thread, so a slow
//! disk never stalls the async workers. Reads come from the in-memory state.

use crate::filter::RunFilter;
use crate::state::MaterializedState;
use crate::store::{RunStore, StoreError};
use crate::wal::Wal;
use async_trait::async_trait;
use kiln_core::{Operation, Run, RunId};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

struct Durable {
    wal: Wal,
    state: MaterializedState,
}

impl Durable {
    /// Log first, then apply; a failed append leaves the state untouched
    fn commit(&mut self, op: &Operation) -> Result<(), StoreError> {
        self.wal.append(op)?;
        self.state.apply(op);
        Ok(())
    }
}

/// Run store persisted to a write-ahead log and rebuilt on open
#[derive(Clone)]
pub struct WalRunStore {
    path: PathBuf,
    inner: Arc<Mutex<Durable>>,
}

impl WalRunStore {
    /// Open the log at `path`, replaying every entry
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let ops = Wal::replay(path)?;
        let state = MaterializedState::from_ops(&ops);
        let wal = Wal::open(path)?;
        tracing::info!(
            path = %path.display(),
            entries = ops.len(),
            runs = state.runs.len(),
            queued = state.queue.len(),
            "run store opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            inner: Arc::new(Mutex::new(Durable { wal, state })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a run id or unique id prefix
    pub fn resolve(&self, id: &str) -> Option<RunId> {
        self.lock().state.get_run(id).map(|r| r.id.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Durable> {
        lock(&self.inner)
    }

    /// Run a logging write on the blocking pool
    async fn write<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Durable) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&mut lock(&inner))).await?
    }
}

fn lock(inner: &Mutex<Durable>) -> MutexGuard<'_, Durable> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl RunStore for WalRunStore {
    async fn insert(&self, run: &Run) -> Result<(), StoreError> {
        let run = run.clone();
        self.write(move |inner| {
            let op = inner.state.insert_op(&run)?;
            inner.commit(&op)
        })
        .await
    }

    async fn load(&self, id: &RunId) -> Result<Run, StoreError> {
        self.lock().state.load(id)
    }

    async fn store(&self, run: &Run, expected_version: u64) -> Result<(), StoreError> {
        let run = run.clone();
        self.write(move |inner| {
            let op = inner.state.store_op(&run, expected_version)?;
            inner.commit(&op)
        })
        .await
    }

    async fn enqueue(&self, id: &RunId) -> Result<(), StoreError> {
        let id = id.clone();
        self.write(move |inner| match inner.state.enqueue_op(&id)? {
            Some(op) => inner.commit(&op),
            None => Ok(()),
        })
        .await
    }

    async fn dequeue(&self) -> Result<Option<RunId>, StoreError> {
        self.write(|inner| {
            let Some(op) = inner.state.dequeue_op() else {
                return Ok(None);
            };
            inner.commit(&op)?;
            Ok(Some(op.run_id().clone()))
        })
        .await
    }

    async fn queued(&self) -> Result<Vec<RunId>, StoreError> {
        Ok(self.lock().state.queue.iter().cloned().collect())
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError> {
        Ok(filter.apply(self.lock().state.runs.values()))
    }
}

#[cfg(test)]
#[path = "durable_tests.rs"]
mod tests;
