// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt directory backed by a fixed ownership table

use super::{PromptDirectory, PromptError};
use async_trait::async_trait;
use kiln_core::{PromptId, UserId};
use std::collections::HashMap;
use std::sync::Arc;

/// Prompt directory loaded once from configuration
#[derive(Clone, Debug, Default)]
pub struct StaticPromptDirectory {
    owners: Arc<HashMap<PromptId, UserId>>,
}

impl StaticPromptDirectory {
    pub fn new(entries: impl IntoIterator<Item = (PromptId, UserId)>) -> Self {
        Self {
            owners: Arc::new(entries.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn owner(&self, prompt_id: &PromptId) -> Option<&UserId> {
        self.owners.get(prompt_id)
    }
}

#[async_trait]
impl PromptDirectory for StaticPromptDirectory {
    async fn prompt_exists(
        &self,
        prompt_id: &PromptId,
        owner: &UserId,
    ) -> Result<bool, PromptError> {
        Ok(self.owners.get(prompt_id) == Some(owner))
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
