// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln-core: Core library for the kiln generation-run engine
//!
//! This crate provides:
//! - The stage catalog and run status vocabulary
//! - The pure run state machine and progress aggregation
//! - Effects, transition events and WAL operations
//! - Clock and id abstractions

pub mod clock;
pub mod id;

pub mod effect;
pub mod event;
pub mod operation;
pub mod progress;
pub mod run;
pub mod stage;
pub mod stats;
pub mod status;

pub use clock::{Clock, FakeClock, SystemClock};
pub use effect::{Effect, TracedEffect};
pub use event::{ProgressUpdate, RunEvent};
pub use id::{IdGen, PromptId, RunId, SequentialIdGen, UserId, UuidIdGen};
pub use operation::Operation;
pub use progress::{aggregate, estimate_remaining, Aggregate};
pub use run::{Run, RunInput, StageReport, StaleReason, Transition, TransitionError};
pub use stage::{StageDef, StageId, StageRecord, StageStatus, UnknownStage, CATALOG};
pub use stats::RunStatistics;
pub use status::{RunStatus, UnknownStatus};
