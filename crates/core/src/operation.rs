// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::id::RunId;
use crate::run::Run;
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Full record written after an insert or an accepted transition
    RunStored { run: Box<Run> },

    /// Run appended to the admission queue
    Enqueued { run_id: RunId },

    /// Run removed from the head of the admission queue
    Dequeued { run_id: RunId },
}

impl Operation {
    /// The run this operation refers to
    pub fn run_id(&self) -> &RunId {
        match self {
            Operation::RunStored { run } => &run.id,
            Operation::Enqueued { run_id } | Operation::Dequeued { run_id } => run_id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
