// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op dispatcher for when no stage executor is attached.

use super::{DispatchError, StageDispatcher};
use async_trait::async_trait;
use kiln_core::{Run, RunId};

/// Dispatcher that does nothing.
///
/// Backs hosts without an executor. A run admitted through it stays
/// admitted until an executing host recovers and re-dispatches it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpDispatcher;

impl NoOpDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StageDispatcher for NoOpDispatcher {
    async fn dispatch(&self, _run: &Run) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn cancel(&self, _run_id: &RunId) -> Result<(), DispatchError> {
        Ok(())
    }
}
