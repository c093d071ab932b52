// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher feeding an in-process executor over a channel

use super::{DispatchError, StageDispatcher};
use async_trait::async_trait;
use kiln_core::{Run, RunId};
use tokio::sync::mpsc;

/// Work items delivered to the executor
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchMessage {
    Dispatch(Box<Run>),
    Cancel(RunId),
}

#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<DispatchMessage>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiving end for the executor
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: DispatchMessage) -> Result<(), DispatchError> {
        self.tx.send(message).map_err(|_| DispatchError::Closed)
    }
}

#[async_trait]
impl StageDispatcher for ChannelDispatcher {
    async fn dispatch(&self, run: &Run) -> Result<(), DispatchError> {
        self.send(DispatchMessage::Dispatch(Box::new(run.clone())))
    }

    async fn cancel(&self, run_id: &RunId) -> Result<(), DispatchError> {
        self.send(DispatchMessage::Cancel(run_id.clone()))
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
