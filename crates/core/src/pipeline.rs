// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted record for a pipeline of job runs.

use crate::id::PipelineId;
use crate::status::PipelineStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pipeline row. Member jobs reference it through `JobRun::pipeline_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub status: PipelineStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Create a new CREATED pipeline
    pub fn new(id: impl Into<PipelineId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: PipelineStatus::Created,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
