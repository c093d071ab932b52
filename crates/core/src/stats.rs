// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate counts over a set of runs

use crate::run::Run;
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// Counts by outcome plus the share of runs that completed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Percentage of all runs that completed, 0 when there are none
    pub success_rate: f64,
}

impl RunStatistics {
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> Self {
        let mut stats = Self::default();
        for run in runs {
            stats.total += 1;
            match run.status {
                RunStatus::Pending => stats.pending += 1,
                RunStatus::Completed => stats.completed += 1,
                RunStatus::Failed => stats.failed += 1,
                RunStatus::Cancelled => stats.cancelled += 1,
                _ => stats.active += 1,
            }
        }
        if stats.total > 0 {
            stats.success_rate = stats.completed as f64 / stats.total as f64 * 100.0;
        }
        stats
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
