// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run search filters

use chrono::{DateTime, Utc};
use kiln_core::{PromptId, Run, RunStatus, UserId};

/// Criteria for listing runs. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilter {
    pub user_id: Option<UserId>,
    pub prompt_id: Option<PromptId>,
    pub status: Option<RunStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub min_progress: Option<f64>,
    pub max_progress: Option<f64>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl RunFilter {
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, run: &Run) -> bool {
        self.user_id.as_ref().map_or(true, |u| &run.user_id == u)
            && self.prompt_id.as_ref().map_or(true, |p| &run.prompt_id == p)
            && self.status.map_or(true, |s| run.status == s)
            && self.created_after.map_or(true, |t| run.created_at >= t)
            && self.created_before.map_or(true, |t| run.created_at <= t)
            && self.min_progress.map_or(true, |p| run.progress >= p)
            && self.max_progress.map_or(true, |p| run.progress <= p)
    }

    /// Filter, order newest first, then paginate
    pub fn apply<'a>(&self, runs: impl IntoIterator<Item = &'a Run>) -> Vec<Run> {
        let mut matched: Vec<&Run> = runs.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
