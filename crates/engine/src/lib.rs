// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kiln execution engine

mod broadcast;
mod config;
mod engine;
mod error;
mod machine;
mod scheduler;

pub use broadcast::{
    ChannelObserver, DeliveryError, Observer, ProgressBroadcaster, Subscription, SubscriptionId,
};
pub use config::{EngineConfig, DEFAULT_CAPACITY, DEFAULT_CONFLICT_RETRIES};
pub use engine::{Engine, EngineDeps};
pub use error::EngineError;
pub use machine::{Outcome, RunMachine};
pub use scheduler::{AdmissionScheduler, Recovery};
