// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted record for a single job run.

use crate::id::{JobId, PipelineId};
use crate::result::JobResult;
use crate::status::{FailureCategory, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the append-only `metadata.retry_history` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryHistoryEntry {
    pub attempt: u32,
    pub timestamp: DateTime<Utc>,
    /// Result of the attempt being retired, kept for debugging
    pub result: Option<JobResult>,
    pub reason: String,
}

/// Configuration for creating a new job run
#[derive(Debug, Clone)]
pub struct JobRunConfig {
    pub id: JobId,
    /// External handle; also the queue-side dedup id
    pub urn: String,
    /// Registry name of the function to execute
    pub job_function: String,
    pub pipeline_id: Option<PipelineId>,
    pub job_params: Value,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl JobRunConfig {
    pub fn new(id: impl Into<JobId>, urn: impl Into<String>, job_function: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            urn: urn.into(),
            job_function: job_function.into(),
            pipeline_id: None,
            job_params: Value::Object(Map::new()),
            max_retries: 0,
            retry_delay_seconds: 0,
        }
    }

    pub fn pipeline(mut self, pipeline_id: impl Into<PipelineId>) -> Self {
        self.pipeline_id = Some(pipeline_id.into());
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.job_params = params;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_delay_seconds(mut self, seconds: u64) -> Self {
        self.retry_delay_seconds = seconds;
        self
    }
}

/// A job run row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: JobId,
    pub urn: String,
    pub job_function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<PipelineId>,
    pub status: JobStatus,
    /// Opaque payload the job function reads its inputs from
    pub job_params: Value,
    /// Scratchpad: `result`, `retry_history`, execution diagnostics
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_current: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub retry_delay_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_category: Option<FailureCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_traceback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JobRun {
    /// Create a new PENDING job run
    pub fn new(config: JobRunConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            id: config.id,
            urn: config.urn,
            job_function: config.job_function,
            pipeline_id: config.pipeline_id,
            status: JobStatus::Pending,
            job_params: config.job_params,
            metadata: Map::new(),
            progress_current: None,
            progress_total: None,
            progress_message: None,
            started_at: None,
            finished_at: None,
            retry_count: 0,
            max_retries: config.max_retries,
            retry_delay_seconds: config.retry_delay_seconds,
            failure_category: None,
            error_message: None,
            error_traceback: None,
            created_at,
        }
    }

    /// Stored result of the most recent attempt, if any
    pub fn result(&self) -> Option<JobResult> {
        self.metadata
            .get("result")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_result(&mut self, result: &JobResult) -> Result<(), serde_json::Error> {
        self.metadata
            .insert("result".to_string(), serde_json::to_value(result)?);
        Ok(())
    }

    /// Remove and return the stored result (used when preparing a retry)
    pub fn take_result(&mut self) -> Option<JobResult> {
        self.metadata
            .remove("result")
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn retry_history(&self) -> Vec<RetryHistoryEntry> {
        self.metadata
            .get("retry_history")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Append to the retry history. The list is append-only; entries are
    /// never rewritten once recorded.
    pub fn push_retry_history(&mut self, entry: RetryHistoryEntry) -> Result<(), serde_json::Error> {
        let mut history = self.retry_history();
        history.push(entry);
        self.metadata
            .insert("retry_history".to_string(), serde_json::to_value(history)?);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_run_tests.rs"]
mod tests;
