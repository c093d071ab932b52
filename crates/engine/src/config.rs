// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tuning knobs

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Maximum number of runs executing at once
pub const DEFAULT_CAPACITY: usize = 4;

/// Compare-and-store retries before giving up
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Engine configuration (the `[engine]` table of kiln.toml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub capacity: usize,
    pub max_conflict_retries: u32,
}

impl EngineConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.capacity == 0 {
            return Err(EngineError::Config("capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
