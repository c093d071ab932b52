// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process engine host
//!
//! Opens the write-ahead log in the state directory, wires the engine to
//! the configured prompts and the simulated executor, and follows runs
//! until they finish.
//!
//! A [`Host::detached`] host has no executor. Runs it admits keep their
//! slot in the log and are re-dispatched by the next executing host.

use crate::config::{ExecutorConfig, KilnConfig, WAL_FILE};
use crate::executor::SimulatedExecutor;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use kiln_adapters::{
    ChannelDispatcher, DispatchMessage, NoOpDispatcher, StageDispatcher, StaticPromptDirectory,
    TracedDispatcher, TracedPromptDirectory,
};
use kiln_core::{Run, RunId, SystemClock, UuidIdGen};
use kiln_engine::{ChannelObserver, Engine, EngineDeps};
use kiln_storage::WalRunStore;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type KilnEngine<D = ChannelDispatcher> = Engine<
    WalRunStore,
    TracedPromptDirectory<StaticPromptDirectory>,
    TracedDispatcher<D>,
    SystemClock,
    UuidIdGen,
>;

/// Host used by commands that only read or update the log
pub type DetachedHost = Host<NoOpDispatcher>;

pub struct Host<D = ChannelDispatcher> {
    engine: Arc<KilnEngine<D>>,
    store: WalRunStore,
    executor: ExecutorConfig,
    // Kept open until the executor takes it
    dispatch_rx: Option<mpsc::UnboundedReceiver<DispatchMessage>>,
}

impl Host {
    /// Host that executes the runs it admits
    pub fn executing(config: &KilnConfig, state_dir: &Path) -> Result<Self> {
        let (dispatcher, dispatch_rx) = ChannelDispatcher::new();
        Self::open(config, state_dir, dispatcher, Some(dispatch_rx))
    }
}

impl Host<NoOpDispatcher> {
    /// Host for commands that never run stages
    pub fn detached(config: &KilnConfig, state_dir: &Path) -> Result<Self> {
        Self::open(config, state_dir, NoOpDispatcher::new(), None)
    }
}

impl<D: StageDispatcher> Host<D> {
    fn open(
        config: &KilnConfig,
        state_dir: &Path,
        dispatcher: D,
        dispatch_rx: Option<mpsc::UnboundedReceiver<DispatchMessage>>,
    ) -> Result<Self> {
        let path = state_dir.join(WAL_FILE);
        let store = WalRunStore::open(&path)
            .with_context(|| format!("failed to open run log {}", path.display()))?;
        let prompts = StaticPromptDirectory::new(
            config
                .prompts
                .iter()
                .map(|p| (p.id.clone(), p.owner.clone())),
        );
        let engine = Engine::new(
            EngineDeps {
                store: store.clone(),
                prompts: TracedPromptDirectory::new(prompts),
                dispatcher: TracedDispatcher::new(dispatcher),
            },
            &config.engine,
            SystemClock,
            UuidIdGen,
        )?;

        Ok(Self {
            engine: Arc::new(engine),
            store,
            executor: config.executor.clone(),
            dispatch_rx,
        })
    }

    pub fn engine(&self) -> &KilnEngine<D> {
        &self.engine
    }

    /// Resolve a full run id or a unique prefix of one
    pub fn resolve(&self, id: &str) -> Option<RunId> {
        self.store.resolve(id)
    }

    /// Resolve an id, failing when no run matches
    pub fn require(&self, id: &str) -> Result<RunId> {
        self.resolve(id)
            .with_context(|| format!("run not found: {}", id))
    }
}

impl Host {

    /// Start the simulated executor and re-attach runs left by earlier invocations
    pub async fn start(&mut self) -> Result<()> {
        if let Some(rx) = self.dispatch_rx.take() {
            let executor = SimulatedExecutor::new(Arc::clone(&self.engine), self.executor.clone());
            tokio::spawn(executor.run(rx));
        }
        let recovery = self.engine.recover().await?;
        if !recovery.resumed.is_empty() || !recovery.requeued.is_empty() {
            tracing::info!(
                resumed = recovery.resumed.len(),
                requeued = recovery.requeued.len(),
                "picked up unfinished runs"
            );
        }
        Ok(())
    }

    /// Print progress for `runs` until every one of them is terminal
    ///
    /// Ctrl-C cancels the runs still in flight and keeps following until
    /// the cancellations land.
    pub async fn follow(&self, runs: &[RunId], format: OutputFormat) -> Result<Vec<Run>> {
        let (observer, mut rx) = ChannelObserver::new();
        let mut subscriptions = Vec::with_capacity(runs.len());
        for run_id in runs {
            subscriptions.push(self.engine.subscribe(run_id, observer.clone()).await?);
        }
        drop(observer);

        let mut open: HashSet<RunId> = runs.iter().cloned().collect();
        let mut interrupted = false;
        while !open.is_empty() {
            tokio::select! {
                update = rx.recv() => {
                    let Some(update) = update else { break };
                    output::print_update(&update, format);
                    if update.status().is_terminal() {
                        open.remove(update.run_id());
                    }
                }
                _ = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    eprintln!("Interrupted, cancelling {} run(s)", open.len());
                    for run_id in &open {
                        if let Err(e) = self.engine.cancel(run_id).await {
                            tracing::debug!(%run_id, error = %e, "cancel on interrupt");
                        }
                    }
                }
            }
        }
        drop(subscriptions);

        let mut finished = Vec::with_capacity(runs.len());
        for run_id in runs {
            finished.push(self.engine.get(run_id).await?);
        }
        Ok(finished)
    }
}
