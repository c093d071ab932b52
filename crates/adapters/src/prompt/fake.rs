// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake prompt directory for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PromptDirectory, PromptError};
use async_trait::async_trait;
use kiln_core::{PromptId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded prompt lookup
#[derive(Debug, Clone, PartialEq)]
pub struct PromptCall {
    pub prompt_id: PromptId,
    pub owner: UserId,
}

#[derive(Default)]
struct FakePromptState {
    prompts: HashMap<PromptId, UserId>,
    unavailable: bool,
    calls: Vec<PromptCall>,
}

/// Fake prompt directory for testing
#[derive(Clone, Default)]
pub struct FakePromptDirectory {
    inner: Arc<Mutex<FakePromptState>>,
}

impl FakePromptDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt owned by `owner`
    pub fn add(&self, prompt_id: impl Into<PromptId>, owner: impl Into<UserId>) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .prompts
            .insert(prompt_id.into(), owner.into());
    }

    /// Make every lookup fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).unavailable = unavailable;
    }

    /// Get all recorded lookups
    pub fn calls(&self) -> Vec<PromptCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }
}

#[async_trait]
impl PromptDirectory for FakePromptDirectory {
    async fn prompt_exists(
        &self,
        prompt_id: &PromptId,
        owner: &UserId,
    ) -> Result<bool, PromptError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(PromptCall {
            prompt_id: prompt_id.clone(),
            owner: owner.clone(),
        });
        if inner.unavailable {
            return Err(PromptError::Unavailable("fake outage".to_string()));
        }
        Ok(inner.prompts.get(prompt_id) == Some(owner))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
