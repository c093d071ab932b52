// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::dispatch::{DispatchError, StageDispatcher};
use crate::prompt::{PromptDirectory, PromptError};
use async_trait::async_trait;
use kiln_core::{PromptId, Run, RunId, UserId};
use tracing::Instrument;

/// Wrapper that adds tracing to any PromptDirectory
#[derive(Clone)]
pub struct TracedPromptDirectory<P> {
    inner: P,
}

impl<P> TracedPromptDirectory<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: PromptDirectory> PromptDirectory for TracedPromptDirectory<P> {
    async fn prompt_exists(
        &self,
        prompt_id: &PromptId,
        owner: &UserId,
    ) -> Result<bool, PromptError> {
        let span = tracing::info_span!("prompt.exists", %prompt_id, %owner);

        async {
            let start = std::time::Instant::now();
            let result = self.inner.prompt_exists(prompt_id, owner).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(exists) => tracing::debug!(exists, elapsed_ms, "looked up"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "lookup failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any StageDispatcher
#[derive(Clone)]
pub struct TracedDispatcher<D> {
    inner: D,
}

impl<D> TracedDispatcher<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: StageDispatcher> StageDispatcher for TracedDispatcher<D> {
    async fn dispatch(&self, run: &Run) -> Result<(), DispatchError> {
        let span = tracing::info_span!("dispatch.start", run_id = %run.id);

        async {
            tracing::info!(prompt_id = %run.prompt_id, "dispatching");

            let start = std::time::Instant::now();
            let result = self.inner.dispatch(run).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "dispatched"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "dispatch failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn cancel(&self, run_id: &RunId) -> Result<(), DispatchError> {
        let span = tracing::info_span!("dispatch.cancel", %run_id);

        async {
            let result = self.inner.cancel(run_id).await;
            // The executor may already have finished with the run
            match &result {
                Ok(()) => tracing::info!("cancel signalled"),
                Err(e) => tracing::warn!(error = %e, "cancel signal failed (may be expected)"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
