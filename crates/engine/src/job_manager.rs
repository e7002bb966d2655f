// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Individual job lifecycle management.
//!
//! The manager mutates a single job run's row through the session and
//! flushes each operation; it never commits. Commit responsibility lies
//! with the caller, which in practice is the dispatch decorator.
//!
//! Precondition violations raise [`ManagerError::Transition`], distinct
//! from the persistence failures raised when the store rejects a flush.

use crate::base::ManagerBase;
use crate::error::{classify_failure, JobError, ManagerError};
use mj_adapters::JobQueue;
use mj_core::{
    Clock, FailureCategory, JobId, JobResult, JobRun, JobStatus, PipelineId, RetryHistoryEntry,
    CANCELLED_JOB_STATUSES, RETRYABLE_FAILURE_CATEGORIES, RETRYABLE_JOB_STATUSES,
    STARTABLE_JOB_STATUSES, TERMINAL_JOB_STATUSES,
};
use mj_storage::Session;
use std::sync::Arc;

/// Manages one job run's state transitions, progress, and retry
/// preparation.
#[derive(Clone)]
pub struct JobManager {
    base: ManagerBase,
    job_id: JobId,
}

impl JobManager {
    /// Build a manager for an existing job run.
    ///
    /// Fails with a database error when the job cannot be fetched,
    /// indicating connectivity issues or an invalid id.
    pub fn new(
        db: Session,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
        job_id: JobId,
    ) -> Result<Self, ManagerError> {
        let manager = Self {
            base: ManagerBase::new(db, queue, clock),
            job_id,
        };
        manager.job()?;
        Ok(manager)
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn db(&self) -> &Session {
        &self.base.db
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.base.clock
    }

    /// The managed job run with all fields populated
    pub fn job(&self) -> Result<JobRun, ManagerError> {
        Ok(self.base.db.job_run(&self.job_id)?)
    }

    pub fn job_status(&self) -> Result<JobStatus, ManagerError> {
        Ok(self.job()?.status)
    }

    pub fn pipeline_id(&self) -> Result<Option<PipelineId>, ManagerError> {
        Ok(self.job()?.pipeline_id)
    }

    fn save(&self, job: &JobRun) -> Result<(), ManagerError> {
        self.base.db.upsert_job_run(job);
        self.base
            .db
            .flush()
            .map_err(|e| ManagerError::StatePersistence(e.to_string()))
    }

    /// Transition the job from PENDING or QUEUED to RUNNING.
    ///
    /// Records the start timestamp and resets progress to 0/100.
    pub fn start_job(&self) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        if !STARTABLE_JOB_STATUSES.contains(&job.status) {
            tracing::error!(job_id = %self.job_id, status = %job.status, "invalid job start attempt");
            return Err(ManagerError::Transition(format!(
                "cannot start job {} from status {}",
                self.job_id, job.status
            )));
        }

        job.status = JobStatus::Running;
        job.started_at = Some(self.base.clock.now());
        job.progress_current = Some(0);
        job.progress_total = Some(100);
        job.progress_message = Some("Job began execution".to_string());
        self.save(&job)?;

        tracing::info!(job_id = %self.job_id, "job marked as started");
        Ok(())
    }

    /// Transition the job from PENDING to QUEUED ahead of an enqueue.
    pub fn prepare_queue(&self) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        if job.status != JobStatus::Pending {
            tracing::error!(job_id = %self.job_id, status = %job.status, "invalid job queue attempt");
            return Err(ManagerError::Transition(format!(
                "cannot queue job {} from status {}",
                self.job_id, job.status
            )));
        }

        job.status = JobStatus::Queued;
        job.progress_message = Some("Job queued for execution".to_string());
        self.save(&job)?;

        tracing::debug!(job_id = %self.job_id, "job prepared for queueing");
        Ok(())
    }

    /// Transition the job to a terminal status, recording the result and
    /// any error details.
    pub fn complete_job(
        &self,
        status: JobStatus,
        result: &JobResult,
        error: Option<&JobError>,
    ) -> Result<(), ManagerError> {
        if !TERMINAL_JOB_STATUSES.contains(&status) {
            tracing::error!(job_id = %self.job_id, %status, "invalid job completion status");
            return Err(ManagerError::Transition(format!(
                "cannot complete job {} to non-terminal status {status}",
                self.job_id
            )));
        }

        let mut job = self.job()?;
        job.status = status;
        job.set_result(result)
            .map_err(|e| ManagerError::StatePersistence(format!("result not serializable: {e}")))?;
        job.finished_at = Some(self.base.clock.now());

        if status == JobStatus::Failed {
            // UNKNOWN until an error provides a classification
            job.failure_category = Some(FailureCategory::Unknown);
            if job.error_message.is_none() {
                if let Some(exception) = result.exception() {
                    job.error_message = Some(exception.message.clone());
                }
            }
        }

        if let Some(error) = error {
            job.error_message = Some(error.to_string());
            job.error_traceback = Some(format!("{error:?}"));
            job.failure_category = Some(classify_failure(error));
        }

        self.save(&job)?;
        tracing::info!(job_id = %self.job_id, %status, "job marked as completed");
        Ok(())
    }

    pub fn succeed_job(&self, result: &JobResult) -> Result<(), ManagerError> {
        self.complete_job(JobStatus::Succeeded, result, None)
    }

    pub fn fail_job(&self, error: &JobError, result: &JobResult) -> Result<(), ManagerError> {
        self.complete_job(JobStatus::Failed, result, Some(error))
    }

    /// Fail from a structured result, taking the error detail from the
    /// result's own exception field.
    pub fn fail_job_from_result(&self, result: &JobResult) -> Result<(), ManagerError> {
        self.complete_job(JobStatus::Failed, result, None)
    }

    pub fn cancel_job(&self, result: &JobResult) -> Result<(), ManagerError> {
        self.complete_job(JobStatus::Cancelled, result, None)
    }

    pub fn skip_job(&self, result: &JobResult) -> Result<(), ManagerError> {
        self.complete_job(JobStatus::Skipped, result, None)
    }

    /// Reset a FAILED/CANCELLED/SKIPPED job to PENDING for re-enqueue.
    ///
    /// Increments the retry count, clears execution fields, and appends
    /// the retired attempt to the append-only retry history.
    pub fn prepare_retry(&self, reason: &str) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        if !RETRYABLE_JOB_STATUSES.contains(&job.status) {
            tracing::error!(job_id = %self.job_id, status = %job.status, "invalid job retry attempt");
            return Err(ManagerError::Transition(format!(
                "cannot retry job {} from status {}",
                self.job_id, job.status
            )));
        }

        let prior_result = job.take_result();
        job.status = JobStatus::Pending;
        job.retry_count += 1;
        job.progress_message = Some("Job retry prepared".to_string());
        job.error_message = None;
        job.error_traceback = None;
        job.failure_category = None;
        job.finished_at = None;
        job.started_at = None;
        job.push_retry_history(RetryHistoryEntry {
            attempt: job.retry_count,
            timestamp: self.base.clock.now(),
            result: prior_result,
            reason: reason.to_string(),
        })
        .map_err(|e| ManagerError::StatePersistence(format!("retry history not serializable: {e}")))?;

        self.save(&job)?;
        tracing::info!(job_id = %self.job_id, retry_count = job.retry_count, reason, "job prepared for retry");
        Ok(())
    }

    /// Reset the job to its initial state, dropping all execution history.
    pub fn reset_job(&self) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        job.status = JobStatus::Pending;
        job.started_at = None;
        job.finished_at = None;
        job.progress_current = None;
        job.progress_total = None;
        job.progress_message = None;
        job.error_message = None;
        job.error_traceback = None;
        job.failure_category = None;
        job.retry_count = 0;
        job.metadata = serde_json::Map::new();
        self.save(&job)?;

        tracing::info!(job_id = %self.job_id, "job reset to initial state");
        Ok(())
    }

    pub fn update_progress(
        &self,
        current: u32,
        total: u32,
        message: Option<&str>,
    ) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        job.progress_current = Some(current);
        job.progress_total = Some(total);
        if let Some(message) = message {
            job.progress_message = Some(message.to_string());
        }
        self.save(&job)?;
        tracing::debug!(job_id = %self.job_id, current, total, "updated job progress");
        Ok(())
    }

    pub fn increment_progress(&self, amount: u32, message: Option<&str>) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        job.progress_current = Some(job.progress_current.unwrap_or(0) + amount);
        if let Some(message) = message {
            job.progress_message = Some(message.to_string());
        }
        self.save(&job)?;
        Ok(())
    }

    /// Set the progress total once it becomes known during execution.
    pub fn set_progress_total(&self, total: u32, message: Option<&str>) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        job.progress_total = Some(total);
        if let Some(message) = message {
            job.progress_message = Some(message.to_string());
        }
        self.save(&job)?;
        Ok(())
    }

    pub fn update_status_message(&self, message: &str) -> Result<(), ManagerError> {
        let mut job = self.job()?;
        job.progress_message = Some(message.to_string());
        self.save(&job)?;
        Ok(())
    }

    /// Whether a long-running job should stop cooperatively.
    pub fn is_cancelled(&self) -> Result<bool, ManagerError> {
        Ok(CANCELLED_JOB_STATUSES.contains(&self.job_status()?))
    }

    /// Whether the job is eligible for an automatic retry: FAILED, under
    /// its retry budget, and carrying a retryable failure category.
    pub fn should_retry(&self) -> Result<bool, ManagerError> {
        let job = self.job()?;

        if job.status != JobStatus::Failed {
            tracing::debug!(job_id = %self.job_id, status = %job.status, "not retryable: not failed");
            return Ok(false);
        }
        if job.retry_count >= job.max_retries {
            tracing::debug!(job_id = %self.job_id, retry_count = job.retry_count, "not retryable: max retries reached");
            return Ok(false);
        }
        let retryable_category = job
            .failure_category
            .is_some_and(|c| RETRYABLE_FAILURE_CATEGORIES.contains(&c));
        if !retryable_category {
            tracing::debug!(job_id = %self.job_id, "not retryable: failure category not retryable");
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
