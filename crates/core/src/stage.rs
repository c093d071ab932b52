// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage catalog and per-run stage records
//!
//! The generation pipeline is a fixed, ordered sequence of stages. Every run
//! materializes its `stages` array from [`CATALOG`] at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Planning,
    CoarseGen,
    MeshRecon,
    UvUnwrap,
    TextureBake,
    QaSafety,
    Optimize,
    Export,
    Publish,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Planning => "planning",
            StageId::CoarseGen => "coarse_gen",
            StageId::MeshRecon => "mesh_recon",
            StageId::UvUnwrap => "uv_unwrap",
            StageId::TextureBake => "texture_bake",
            StageId::QaSafety => "qa_safety",
            StageId::Optimize => "optimize",
            StageId::Export => "export",
            StageId::Publish => "publish",
        }
    }

    /// Catalog definition for this stage
    pub fn def(&self) -> &'static StageDef {
        // The catalog lists every variant exactly once, in declaration order
        &CATALOG[*self as usize]
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for StageId {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .map(|def| def.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// Static definition of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDef {
    pub id: StageId,
    pub name: &'static str,
    /// Nominal duration weight, used only for advisory estimates
    pub nominal_secs: u32,
}

/// The generation pipeline, in execution order
pub const CATALOG: [StageDef; 9] = [
    StageDef {
        id: StageId::Planning,
        name: "Planning",
        nominal_secs: 10,
    },
    StageDef {
        id: StageId::CoarseGen,
        name: "Coarse Generation",
        nominal_secs: 60,
    },
    StageDef {
        id: StageId::MeshRecon,
        name: "Mesh Reconstruction",
        nominal_secs: 45,
    },
    StageDef {
        id: StageId::UvUnwrap,
        name: "UV Unwrapping",
        nominal_secs: 20,
    },
    StageDef {
        id: StageId::TextureBake,
        name: "Texture Baking",
        nominal_secs: 90,
    },
    StageDef {
        id: StageId::QaSafety,
        name: "QA & Safety",
        nominal_secs: 15,
    },
    StageDef {
        id: StageId::Optimize,
        name: "Optimization",
        nominal_secs: 30,
    },
    StageDef {
        id: StageId::Export,
        name: "Export",
        nominal_secs: 20,
    },
    StageDef {
        id: StageId::Publish,
        name: "Publish",
        nominal_secs: 10,
    },
];

/// Status of a single stage within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Failed)
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        };
        f.pad(s)
    }
}

/// One pipeline step within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: StageId,
    pub name: String,
    pub status: StageStatus,
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub output: Option<serde_json::Value>,
}

impl StageRecord {
    pub fn pending(def: &StageDef) -> Self {
        Self {
            id: def.id,
            name: def.name.to_string(),
            status: StageStatus::Pending,
            progress: 0.0,
            started_at: None,
            completed_at: None,
            error: None,
            output: None,
        }
    }
}

/// Materialize a fresh, all-pending stage array from the catalog
pub fn materialize() -> Vec<StageRecord> {
    CATALOG.iter().map(StageRecord::pending).collect()
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
