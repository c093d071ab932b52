// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handing admitted runs to stage executors

mod channel;
mod noop;

pub use channel::{ChannelDispatcher, DispatchMessage};
pub use noop::NoOpDispatcher;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DispatchCall, FakeDispatcher};

use async_trait::async_trait;
use kiln_core::{Run, RunId};
use thiserror::Error;

/// Errors from dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("stage executor is not accepting work")]
    Closed,
    #[error("dispatch rejected: {0}")]
    Rejected(String),
}

/// Starts and stops stage execution for admitted runs
///
/// Both calls are fire-and-forget: progress comes back through the engine's
/// `advance` entry point, not through this trait.
#[async_trait]
pub trait StageDispatcher: Clone + Send + Sync + 'static {
    /// Begin executing the run's stages
    async fn dispatch(&self, run: &Run) -> Result<(), DispatchError>;

    /// Cooperative cancellation signal
    async fn cancel(&self, run_id: &RunId) -> Result<(), DispatchError>;
}
