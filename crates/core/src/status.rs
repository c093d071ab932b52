// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle states

use crate::stage::StageId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// The lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Planning,
    CoarseGen,
    MeshRecon,
    UvUnwrap,
    TextureBake,
    QaSafety,
    Optimize,
    Export,
    Publish,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Every status, in lifecycle order
    pub const ALL: [RunStatus; 13] = [
        RunStatus::Pending,
        RunStatus::Planning,
        RunStatus::CoarseGen,
        RunStatus::MeshRecon,
        RunStatus::UvUnwrap,
        RunStatus::TextureBake,
        RunStatus::QaSafety,
        RunStatus::Optimize,
        RunStatus::Export,
        RunStatus::Publish,
        RunStatus::Completed,
        RunStatus::Failed,
        RunStatus::Cancelled,
    ];

    /// The run-level status mirroring an executing stage
    pub fn for_stage(stage: StageId) -> Self {
        match stage {
            StageId::Planning => RunStatus::Planning,
            StageId::CoarseGen => RunStatus::CoarseGen,
            StageId::MeshRecon => RunStatus::MeshRecon,
            StageId::UvUnwrap => RunStatus::UvUnwrap,
            StageId::TextureBake => RunStatus::TextureBake,
            StageId::QaSafety => RunStatus::QaSafety,
            StageId::Optimize => RunStatus::Optimize,
            StageId::Export => RunStatus::Export,
            StageId::Publish => RunStatus::Publish,
        }
    }

    /// Check if this status accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    /// Check if a run in this status occupies an execution slot
    pub fn is_executing(&self) -> bool {
        !self.is_terminal() && *self != RunStatus::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Planning => "planning",
            RunStatus::CoarseGen => "coarse_gen",
            RunStatus::MeshRecon => "mesh_recon",
            RunStatus::UvUnwrap => "uv_unwrap",
            RunStatus::TextureBake => "texture_bake",
            RunStatus::QaSafety => "qa_safety",
            RunStatus::Optimize => "optimize",
            RunStatus::Export => "export",
            RunStatus::Publish => "publish",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown run status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for RunStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
