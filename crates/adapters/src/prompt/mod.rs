// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt ownership lookups

mod directory;

pub use directory::StaticPromptDirectory;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePromptDirectory, PromptCall};

use async_trait::async_trait;
use kiln_core::{PromptId, UserId};
use thiserror::Error;

/// Errors from prompt lookups
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt directory unavailable: {0}")]
    Unavailable(String),
}

/// Answers whether a prompt exists and belongs to a user
#[async_trait]
pub trait PromptDirectory: Clone + Send + Sync + 'static {
    async fn prompt_exists(&self, prompt_id: &PromptId, owner: &UserId)
        -> Result<bool, PromptError>;
}
