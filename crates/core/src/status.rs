// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and pipeline status machines plus the status groupings used for
//! state validation, dependency checking, and coordination.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single job run through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Known to the pipeline, waiting for dependencies or a queue slot
    Pending,
    /// Accepted by the work queue, not yet running
    Queued,
    Running,
    Succeeded,
    Failed,
    /// Explicitly stopped while active
    Cancelled,
    /// Never ran because a predecessor made it unreachable
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_JOB_STATUSES.contains(self)
    }

    pub fn is_active(&self) -> bool {
        ACTIVE_JOB_STATUSES.contains(self)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Job statuses that can be transitioned to RUNNING.
pub const STARTABLE_JOB_STATUSES: &[JobStatus] = &[JobStatus::Queued, JobStatus::Pending];

/// Job statuses indicating finished execution.
pub const TERMINAL_JOB_STATUSES: &[JobStatus] = &[
    JobStatus::Succeeded,
    JobStatus::Failed,
    JobStatus::Cancelled,
    JobStatus::Skipped,
];

/// Job statuses that signal a long-running job to stop cooperatively.
pub const CANCELLED_JOB_STATUSES: &[JobStatus] =
    &[JobStatus::Cancelled, JobStatus::Skipped, JobStatus::Failed];

/// Job statuses that can be reset to PENDING for retry.
pub const RETRYABLE_JOB_STATUSES: &[JobStatus] =
    &[JobStatus::Failed, JobStatus::Cancelled, JobStatus::Skipped];

/// Job statuses subject to bulk cancellation when a pipeline fails.
pub const ACTIVE_JOB_STATUSES: &[JobStatus] =
    &[JobStatus::Pending, JobStatus::Queued, JobStatus::Running];

/// Status of a pipeline through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Recorded but not yet started
    Created,
    Running,
    /// No new enqueues; running jobs continue
    Paused,
    Succeeded,
    /// Terminal mix of SUCCEEDED with SKIPPED/CANCELLED, no FAILED
    Partial,
    Failed,
    Cancelled,
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_PIPELINE_STATUSES.contains(self)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Created => write!(f, "created"),
            PipelineStatus::Running => write!(f, "running"),
            PipelineStatus::Paused => write!(f, "paused"),
            PipelineStatus::Succeeded => write!(f, "succeeded"),
            PipelineStatus::Partial => write!(f, "partial"),
            PipelineStatus::Failed => write!(f, "failed"),
            PipelineStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Pipeline statuses that can be transitioned to RUNNING.
pub const STARTABLE_PIPELINE_STATUSES: &[PipelineStatus] =
    &[PipelineStatus::Paused, PipelineStatus::Created];

/// Pipeline statuses indicating finished execution.
pub const TERMINAL_PIPELINE_STATUSES: &[PipelineStatus] = &[
    PipelineStatus::Succeeded,
    PipelineStatus::Failed,
    PipelineStatus::Partial,
    PipelineStatus::Cancelled,
];

/// Pipeline statuses under which remaining active jobs are cancelled.
pub const CANCELLED_PIPELINE_STATUSES: &[PipelineStatus] =
    &[PipelineStatus::Cancelled, PipelineStatus::Failed];

/// Category recorded on a failed job, driving retry eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NetworkError,
    Timeout,
    ServiceUnavailable,
    ValidationError,
    Unknown,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::NetworkError => write!(f, "network_error"),
            FailureCategory::Timeout => write!(f, "timeout"),
            FailureCategory::ServiceUnavailable => write!(f, "service_unavailable"),
            FailureCategory::ValidationError => write!(f, "validation_error"),
            FailureCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// Failure categories considered transient enough to retry.
pub const RETRYABLE_FAILURE_CATEGORIES: &[FailureCategory] = &[
    FailureCategory::NetworkError,
    FailureCategory::Timeout,
    FailureCategory::ServiceUnavailable,
];

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
