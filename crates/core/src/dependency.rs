// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency edges between job runs and their evaluation rules.

use crate::id::JobId;
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation a dependent job requires of its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Predecessor must have SUCCEEDED
    SuccessRequired,
    /// Predecessor must have finished, success or failure
    CompletionRequired,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyType::SuccessRequired => write!(f, "success_required"),
            DependencyType::CompletionRequired => write!(f, "completion_required"),
        }
    }
}

/// Edge from a dependent job to a predecessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDependency {
    pub job_id: JobId,
    pub depends_on_job_id: JobId,
    pub dependency_type: DependencyType,
}

impl JobDependency {
    pub fn new(job_id: impl Into<JobId>, depends_on: impl Into<JobId>, ty: DependencyType) -> Self {
        Self {
            job_id: job_id.into(),
            depends_on_job_id: depends_on.into(),
            dependency_type: ty,
        }
    }
}

/// Whether the predecessor's status satisfies the dependency right now.
///
/// An unmet dependency is not necessarily unreachable; see
/// [`unreachable_reason`] for the terminal-blocker check.
pub fn dependency_is_met(dependency_type: DependencyType, predecessor: JobStatus) -> bool {
    match dependency_type {
        DependencyType::SuccessRequired => predecessor == JobStatus::Succeeded,
        DependencyType::CompletionRequired => {
            predecessor == JobStatus::Succeeded || predecessor == JobStatus::Failed
        }
    }
}

/// Whether the predecessor's status makes the dependency unsatisfiable.
///
/// Returns the skip reason when the dependent can never run:
/// SUCCESS_REQUIRED is unreachable once the predecessor FAILED, SKIPPED, or
/// was CANCELLED; COMPLETION_REQUIRED tolerates FAILED but not
/// SKIPPED/CANCELLED.
pub fn unreachable_reason(
    dependency_type: DependencyType,
    predecessor: JobStatus,
    predecessor_urn: &str,
) -> Option<String> {
    let blocked = match dependency_type {
        DependencyType::SuccessRequired => matches!(
            predecessor,
            JobStatus::Failed | JobStatus::Skipped | JobStatus::Cancelled
        ),
        DependencyType::CompletionRequired => {
            matches!(predecessor, JobStatus::Skipped | JobStatus::Cancelled)
        }
    };

    blocked.then(|| {
        format!(
            "dependency on job {} ({}) cannot be satisfied: predecessor is {}",
            predecessor_urn, dependency_type, predecessor
        )
    })
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
