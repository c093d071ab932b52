// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress broadcaster routing run transitions to observers
//!
//! Every observer first receives a snapshot of the run, then each later
//! transition exactly once and in commit order.

use crate::error::EngineError;
use kiln_core::{ProgressUpdate, Run, RunEvent, RunId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;

/// Why an observer could not take an update
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("observer disconnected")]
    Disconnected,
    #[error("observer failed: {0}")]
    Failed(String),
}

/// Receives progress updates for one run
///
/// `deliver` runs while the broadcaster's registry is locked and must not
/// block.
pub trait Observer: Send + Sync + 'static {
    fn deliver(&self, update: &ProgressUpdate) -> Result<(), DeliveryError>;
}

/// Observer that forwards updates into an unbounded channel
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn deliver(&self, update: &ProgressUpdate) -> Result<(), DeliveryError> {
        self.tx
            .send(update.clone())
            .map_err(|_| DeliveryError::Disconnected)
    }
}

/// Identifies one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    /// Highest version this observer has been sent
    seen: u64,
    observer: Box<dyn Observer>,
}

#[derive(Default)]
struct RunChannel {
    latest: Option<Run>,
    observers: Vec<Registration>,
}

impl RunChannel {
    fn remember(&mut self, run: &Run) {
        if self.latest.as_ref().map_or(true, |l| l.version < run.version) {
            self.latest = Some(run.clone());
        }
    }

    fn is_idle(&self) -> bool {
        self.observers.is_empty() && self.latest.as_ref().map_or(true, Run::is_terminal)
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    runs: HashMap<RunId, RunChannel>,
}

/// Registry of run observers plus the latest known state of each live run
#[derive(Clone, Default)]
pub struct ProgressBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl ProgressBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Latest cached state of a run
    pub fn latest(&self, run_id: &RunId) -> Option<Run> {
        self.registry()
            .runs
            .get(run_id)
            .and_then(|c| c.latest.clone())
    }

    /// Register an observer, delivering the cached state before returning
    pub fn subscribe(
        &self,
        run_id: &RunId,
        observer: impl Observer,
    ) -> Result<Subscription, EngineError> {
        let mut registry = self.registry();
        self.attach(&mut registry, run_id, observer)
    }

    /// Like `subscribe`, seeding the cache with a record read from storage
    ///
    /// A newer cached version wins over `stored`.
    pub fn subscribe_from(
        &self,
        stored: &Run,
        observer: impl Observer,
    ) -> Result<Subscription, EngineError> {
        let mut registry = self.registry();
        registry
            .runs
            .entry(stored.id.clone())
            .or_default()
            .remember(stored);
        self.attach(&mut registry, &stored.id, observer)
    }

    fn attach(
        &self,
        registry: &mut Registry,
        run_id: &RunId,
        observer: impl Observer,
    ) -> Result<Subscription, EngineError> {
        let Some(channel) = registry.runs.get_mut(run_id) else {
            return Err(EngineError::RunNotFound(run_id.clone()));
        };
        let Some(snapshot) = channel.latest.clone() else {
            return Err(EngineError::RunNotFound(run_id.clone()));
        };

        let seen = snapshot.version;
        if let Err(e) = observer.deliver(&ProgressUpdate::Snapshot {
            run: Box::new(snapshot),
        }) {
            if channel.is_idle() {
                registry.runs.remove(run_id);
            }
            return Err(e.into());
        }

        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .runs
            .entry(run_id.clone())
            .or_default()
            .observers
            .push(Registration {
                id,
                seen,
                observer: Box::new(observer),
            });
        tracing::debug!(%run_id, subscription = id.0, version = seen, "observer subscribed");

        Ok(Subscription {
            id,
            run_id: run_id.clone(),
            broadcaster: self.clone(),
        })
    }

    /// Remove a registration; returns false if it was already gone
    pub fn unsubscribe(&self, run_id: &RunId, id: SubscriptionId) -> bool {
        let mut registry = self.registry();
        let Some(channel) = registry.runs.get_mut(run_id) else {
            return false;
        };
        let before = channel.observers.len();
        channel.observers.retain(|r| r.id != id);
        let removed = channel.observers.len() != before;
        if channel.is_idle() {
            registry.runs.remove(run_id);
        }
        if removed {
            tracing::debug!(%run_id, subscription = id.0, "observer unsubscribed");
        }
        removed
    }

    /// Deliver a committed transition to the run's observers
    ///
    /// Failing observers are dropped; publishing itself never fails.
    pub fn publish(&self, run: &Run, event: RunEvent) {
        let mut registry = self.registry();
        let channel = registry.runs.entry(run.id.clone()).or_default();
        channel.remember(run);

        let version = event.version;
        let update = ProgressUpdate::Transition { event };
        channel.observers.retain_mut(|r| {
            if r.seen >= version {
                return true;
            }
            match r.observer.deliver(&update) {
                Ok(()) => {
                    r.seen = version;
                    true
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = %run.id,
                        subscription = r.id.0,
                        error = %e,
                        "dropping observer"
                    );
                    false
                }
            }
        });

        if channel.is_idle() {
            registry.runs.remove(&run.id);
        }
    }

    pub fn observer_count(&self, run_id: &RunId) -> usize {
        self.registry()
            .runs
            .get(run_id)
            .map_or(0, |c| c.observers.len())
    }

    /// Number of runs with a cached state or observers
    pub fn tracked_runs(&self) -> usize {
        self.registry().runs.len()
    }
}

/// Handle for one observer registration; dropping it unsubscribes
pub struct Subscription {
    id: SubscriptionId,
    run_id: RunId,
    broadcaster: ProgressBroadcaster,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Safe to call repeatedly
    pub fn unsubscribe(&self) -> bool {
        self.broadcaster.unsubscribe(&self.run_id, self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("run_id", &self.run_id)
            .finish()
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
