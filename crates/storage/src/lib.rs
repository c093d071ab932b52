// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable run records and the admission queue

mod durable;
mod filter;
mod memory;
mod state;
mod store;
mod wal;

pub use durable::WalRunStore;
pub use filter::RunFilter;
pub use memory::MemoryRunStore;
pub use state::MaterializedState;
pub use store::{RunStore, StoreError};
pub use wal::{Wal, WalError};
