// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run store contract

use crate::filter::RunFilter;
use crate::wal::WalError;
use async_trait::async_trait;
use kiln_core::{Run, RunId};
use thiserror::Error;

/// Errors from run store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run not found: {0}")]
    NotFound(RunId),
    #[error("run already exists: {0}")]
    AlreadyExists(RunId),
    #[error("version conflict on run {run_id}: expected {expected}, found {actual}")]
    Conflict {
        run_id: RunId,
        expected: u64,
        actual: u64,
    },
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error("store write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Keyed storage of run records with compare-and-store writes
///
/// Every successful write is visible to later reads of the same store.
#[async_trait]
pub trait RunStore: Clone + Send + Sync + 'static {
    /// Store a new run; fails if the id is taken
    async fn insert(&self, run: &Run) -> Result<(), StoreError>;

    /// Read the latest record of a run
    async fn load(&self, id: &RunId) -> Result<Run, StoreError>;

    /// Replace a run only if the stored version still equals `expected_version`
    async fn store(&self, run: &Run, expected_version: u64) -> Result<(), StoreError>;

    /// Append a run to the admission queue
    async fn enqueue(&self, id: &RunId) -> Result<(), StoreError>;

    /// Pop the oldest queued run, if any
    async fn dequeue(&self) -> Result<Option<RunId>, StoreError>;

    /// Queued run ids, oldest first
    async fn queued(&self) -> Result<Vec<RunId>, StoreError>;

    /// Runs matching the filter, newest first
    async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, StoreError>;
}
