// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! kiln.toml loading and state directory resolution

use anyhow::{bail, Context, Result};
use kiln_core::{PromptId, StageId, UserId};
use kiln_engine::EngineConfig;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "kiln.toml";

/// Name of the write-ahead log inside the state directory
pub const WAL_FILE: &str = "runs.wal";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KilnConfig {
    pub engine: EngineConfig,
    pub executor: ExecutorConfig,
    #[serde(default = "demo_prompts")]
    pub prompts: Vec<PromptEntry>,
}

/// Simulated stage executor (the `[executor]` table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Delay between two progress reports
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
    /// Reports per stage, the last one finishing the stage
    pub ticks_per_stage: u32,
    /// Stage that fails instead of completing
    pub fail_stage: Option<StageId>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            ticks_per_stage: 5,
            fail_stage: None,
        }
    }
}

/// A prompt known to the static prompt directory
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptEntry {
    pub id: PromptId,
    pub owner: UserId,
}

fn demo_prompts() -> Vec<PromptEntry> {
    vec![PromptEntry {
        id: PromptId::from("demo-prompt"),
        owner: UserId::from("demo-user"),
    }]
}

impl KilnConfig {
    /// Load from `path`, else ./kiln.toml, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::read(Path::new(CONFIG_FILE)),
            None => Ok(Self {
                prompts: demo_prompts(),
                ..Self::default()
            }),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.engine.validate()?;
        if config.executor.ticks_per_stage == 0 {
            bail!("executor.ticks_per_stage must be at least 1");
        }
        Ok(config)
    }
}

/// Resolve the state directory from the flag or the environment
pub fn state_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    resolve_state_dir(flag, |key| std::env::var_os(key))
        .context("cannot determine state directory: set --state-dir or KILN_STATE_DIR")
}

fn resolve_state_dir(
    flag: Option<PathBuf>,
    env: impl Fn(&str) -> Option<OsString>,
) -> Option<PathBuf> {
    if flag.is_some() {
        return flag;
    }
    if let Some(dir) = env("KILN_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = env("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("kiln"));
    }
    env("HOME").map(|home| PathBuf::from(home).join(".local/state/kiln"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
