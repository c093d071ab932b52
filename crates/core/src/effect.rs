// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects requested by run transitions
//!
//! Transitions are pure; the engine executes these effects only after the
//! new run record has been durably written.

use crate::event::RunEvent;
use crate::id::RunId;

/// Side effects that the run state machine requests
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Publish a committed transition to observers
    Emit(RunEvent),
    /// The run reached a terminal state; free its execution slot
    ReleaseSlot { run_id: RunId },
    /// Ask the stage executor to stop working on the run
    SignalCancel { run_id: RunId },
}

/// Trait for operations that should be traced
///
/// Provides consistent naming and structured fields for logging.
pub trait TracedEffect {
    /// Effect name for log spans (e.g., "emit", "release_slot")
    fn name(&self) -> &'static str;

    /// Key-value pairs for structured logging
    fn fields(&self) -> Vec<(&'static str, String)>;
}

impl TracedEffect for Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::Emit(_) => "emit",
            Effect::ReleaseSlot { .. } => "release_slot",
            Effect::SignalCancel { .. } => "signal_cancel",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit(event) => vec![
                ("run_id", event.run_id.to_string()),
                ("event", event.name()),
                ("version", event.version.to_string()),
            ],
            Effect::ReleaseSlot { run_id } | Effect::SignalCancel { run_id } => {
                vec![("run_id", run_id.to_string())]
            }
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
