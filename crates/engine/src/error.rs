// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use crate::broadcast::DeliveryError;
use kiln_adapters::{DispatchError, PromptError};
use kiln_core::{PromptId, RunId, RunStatus, StaleReason, TransitionError, UserId};
use kiln_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("prompt {prompt_id} does not exist or is not owned by {user_id}")]
    InvalidReference { prompt_id: PromptId, user_id: UserId },
    #[error("cannot {operation} run {run_id} in status {status}")]
    InvalidState {
        run_id: RunId,
        status: RunStatus,
        operation: &'static str,
    },
    #[error("run {run_id} is already terminal ({status})")]
    AlreadyTerminal { run_id: RunId, status: RunStatus },
    #[error("stale update for run {run_id}: {reason}")]
    StaleUpdate { run_id: RunId, reason: StaleReason },
    #[error("run {run_id} still conflicted after {attempts} attempts")]
    PersistenceConflict { run_id: RunId, attempts: u32 },
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("prompt directory error: {0}")]
    Prompt(#[from] PromptError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("observer rejected snapshot: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Errors callers may log and discard
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyTerminal { .. } | EngineError::StaleUpdate { .. }
        )
    }
}

impl From<TransitionError> for EngineError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::AlreadyTerminal { run_id, status } => {
                EngineError::AlreadyTerminal { run_id, status }
            }
            TransitionError::InvalidState {
                run_id,
                status,
                operation,
            } => EngineError::InvalidState {
                run_id,
                status,
                operation,
            },
            TransitionError::StaleUpdate { run_id, reason } => {
                EngineError::StaleUpdate { run_id, reason }
            }
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(run_id) => EngineError::RunNotFound(run_id),
            other => EngineError::Store(other),
        }
    }
}
