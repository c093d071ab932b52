// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake dispatcher for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DispatchError, StageDispatcher};
use async_trait::async_trait;
use kiln_core::{Run, RunId};
use std::sync::{Arc, Mutex};

/// Recorded dispatcher call
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCall {
    Dispatch { run_id: RunId },
    Cancel { run_id: RunId },
}

#[derive(Default)]
struct FakeDispatchState {
    calls: Vec<DispatchCall>,
    fail_dispatch: bool,
}

/// Fake dispatcher for testing
#[derive(Clone, Default)]
pub struct FakeDispatcher {
    inner: Arc<Mutex<FakeDispatchState>>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dispatches fail
    pub fn set_fail_dispatch(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_dispatch = fail;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DispatchCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Run ids dispatched so far, in order
    pub fn dispatched(&self) -> Vec<RunId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DispatchCall::Dispatch { run_id } => Some(run_id),
                DispatchCall::Cancel { .. } => None,
            })
            .collect()
    }

    /// Run ids that received a cancellation signal
    pub fn cancelled(&self) -> Vec<RunId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DispatchCall::Cancel { run_id } => Some(run_id),
                DispatchCall::Dispatch { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl StageDispatcher for FakeDispatcher {
    async fn dispatch(&self, run: &Run) -> Result<(), DispatchError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(DispatchCall::Dispatch {
            run_id: run.id.clone(),
        });
        if inner.fail_dispatch {
            return Err(DispatchError::Rejected("fake executor offline".to_string()));
        }
        Ok(())
    }

    async fn cancel(&self, run_id: &RunId) -> Result<(), DispatchError> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(DispatchCall::Cancel {
                run_id: run_id.clone(),
            });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
