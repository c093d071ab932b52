// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborators the engine consumes: prompt lookup and stage dispatch

pub mod dispatch;
pub mod prompt;
pub mod traced;

pub use dispatch::{
    ChannelDispatcher, DispatchError, DispatchMessage, NoOpDispatcher, StageDispatcher,
};
pub use prompt::{PromptDirectory, PromptError, StaticPromptDirectory};
pub use traced::{TracedDispatcher, TracedPromptDirectory};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use dispatch::{DispatchCall, FakeDispatcher};
#[cfg(any(test, feature = "test-support"))]
pub use prompt::{FakePromptDirectory, PromptCall};
