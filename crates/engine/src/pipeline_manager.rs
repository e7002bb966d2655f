// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline coordination: dependency evaluation, ready-set enqueue, and
//! aggregate status transitions.
//!
//! Coordination is re-entered after every job terminates. The manager
//! mutates and flushes, never commits; terminal pipelines are never
//! transitioned except through explicit retry or restart.

use crate::base::ManagerBase;
use crate::error::ManagerError;
use crate::job_manager::JobManager;
use mj_adapters::JobQueue;
use mj_core::{
    dependency_is_met, unreachable_reason, Clock, JobId, JobResult, JobRun, JobStatus, Pipeline,
    PipelineId, PipelineStatus, ACTIVE_JOB_STATUSES, CANCELLED_PIPELINE_STATUSES,
    RETRYABLE_JOB_STATUSES, TERMINAL_PIPELINE_STATUSES,
};
use mj_storage::Session;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Aggregate progress statistics for a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineProgress {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub successful_jobs: usize,
    pub failed_jobs: usize,
    pub running_jobs: usize,
    pub pending_jobs: usize,
    pub completion_percentage: f64,
    pub duration_seconds: i64,
    pub status_counts: HashMap<JobStatus, usize>,
}

/// Coordinates one pipeline's jobs and aggregate status.
#[derive(Clone)]
pub struct PipelineManager {
    base: ManagerBase,
    pipeline_id: PipelineId,
}

impl PipelineManager {
    /// Build a manager for an existing pipeline.
    pub fn new(
        db: Session,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
        pipeline_id: PipelineId,
    ) -> Result<Self, ManagerError> {
        let manager = Self {
            base: ManagerBase::new(db, queue, clock),
            pipeline_id,
        };
        manager.pipeline()?;
        Ok(manager)
    }

    pub fn pipeline_id(&self) -> &PipelineId {
        &self.pipeline_id
    }

    pub fn pipeline(&self) -> Result<Pipeline, ManagerError> {
        Ok(self.base.db.pipeline(&self.pipeline_id)?)
    }

    pub fn pipeline_status(&self) -> Result<PipelineStatus, ManagerError> {
        Ok(self.pipeline()?.status)
    }

    fn job_manager_for(&self, job_id: &JobId) -> Result<JobManager, ManagerError> {
        JobManager::new(
            self.base.db.clone(),
            self.base.queue.clone(),
            self.base.clock.clone(),
            job_id.clone(),
        )
    }

    fn flush(&self) -> Result<(), ManagerError> {
        self.base
            .db
            .flush()
            .map_err(|e| ManagerError::StatePersistence(e.to_string()))
    }

    /// Start the pipeline.
    ///
    /// `coordinate` controls whether ready jobs are enqueued immediately.
    /// Controllers pass `true`; a job that starts its own pipeline from
    /// inside execution passes `false` so its decorator's coordination
    /// pass does not double-enqueue.
    pub async fn start_pipeline(&self, coordinate: bool) -> Result<(), ManagerError> {
        let status = self.pipeline_status()?;
        if status != PipelineStatus::Created {
            tracing::error!(pipeline_id = %self.pipeline_id, %status, "pipeline may not be started");
            return Err(ManagerError::Transition(format!(
                "pipeline {} is in state {status} and may not be started",
                self.pipeline_id
            )));
        }

        self.set_pipeline_status(PipelineStatus::Running)?;
        self.flush()?;
        tracing::info!(pipeline_id = %self.pipeline_id, "pipeline started");

        if coordinate {
            self.coordinate_pipeline().await?;
        }
        Ok(())
    }

    /// Re-entry point after any job terminates.
    ///
    /// Recomputes the aggregate status, cancels remaining work when the
    /// pipeline has failed or been cancelled, and enqueues newly ready
    /// jobs. The enqueue pass may reclassify unreachable jobs as SKIPPED,
    /// so the aggregate is recomputed once more afterwards.
    pub async fn coordinate_pipeline(&self) -> Result<(), ManagerError> {
        let new_status = self.transition_pipeline_status()?;
        self.flush()?;

        if CANCELLED_PIPELINE_STATUSES.contains(&new_status) {
            self.cancel_remaining_jobs("Pipeline failed or cancelled")?;
        }

        if new_status == PipelineStatus::Running {
            self.enqueue_ready_jobs().await?;
            self.transition_pipeline_status()?;
            self.flush()?;
        }
        Ok(())
    }

    /// Recompute the pipeline status from its job status counts.
    ///
    /// Terminal and PAUSED pipelines are left untouched. An empty pipeline
    /// is immediately SUCCEEDED. RUNNING/QUEUED jobs keep the pipeline
    /// RUNNING and PENDING jobs leave the status unchanged, so
    /// completion-tolerant dependents of a failed job still get their
    /// enqueue pass. Failures resolve once the pipeline is quiescent:
    /// FAILED when nothing succeeded, PARTIAL for a mixed outcome.
    pub fn transition_pipeline_status(&self) -> Result<PipelineStatus, ManagerError> {
        let pipeline = self.pipeline()?;
        let counts = self.job_counts_by_status()?;
        let total_jobs: usize = counts.values().sum();
        let old_status = pipeline.status;

        if TERMINAL_PIPELINE_STATUSES.contains(&old_status) {
            tracing::debug!(pipeline_id = %self.pipeline_id, status = %old_status, "terminal pipeline; skipping update");
            return Ok(old_status);
        }
        if old_status == PipelineStatus::Paused {
            tracing::debug!(pipeline_id = %self.pipeline_id, "paused pipeline; skipping update");
            return Ok(old_status);
        }

        if total_jobs == 0 {
            tracing::debug!(pipeline_id = %self.pipeline_id, "no jobs in pipeline; considering it complete");
            self.set_pipeline_status(PipelineStatus::Succeeded)?;
            return Ok(PipelineStatus::Succeeded);
        }

        let count = |status: JobStatus| counts.get(&status).copied().unwrap_or(0);
        let succeeded = count(JobStatus::Succeeded);

        let new_status = if count(JobStatus::Running) > 0 || count(JobStatus::Queued) > 0 {
            PipelineStatus::Running
        } else if count(JobStatus::Pending) > 0 {
            // Pending jobs may be picked up soon or proactively skipped by
            // the enqueue pass; leave the status as-is until then. A
            // terminal pipeline must never hold pending jobs.
            old_status
        } else if count(JobStatus::Failed) > 0 {
            if succeeded > 0 {
                PipelineStatus::Partial
            } else {
                PipelineStatus::Failed
            }
        } else if succeeded > 0 {
            if succeeded == total_jobs {
                PipelineStatus::Succeeded
            } else {
                PipelineStatus::Partial
            }
        } else {
            PipelineStatus::Cancelled
        };

        if new_status != old_status {
            self.set_pipeline_status(new_status)?;
            tracing::info!(pipeline_id = %self.pipeline_id, from = %old_status, to = %new_status, "pipeline status updated");
        } else {
            tracing::debug!(pipeline_id = %self.pipeline_id, status = %old_status, "no pipeline status change");
        }

        Ok(new_status)
    }

    /// Enqueue every PENDING job whose dependencies are satisfied; skip
    /// jobs whose dependencies have become unreachable.
    ///
    /// Job rows are flushed once before the queue gateway is called, so
    /// an enqueue failure leaves jobs QUEUED for the next coordination.
    pub async fn enqueue_ready_jobs(&self) -> Result<(), ManagerError> {
        let status = self.pipeline_status()?;
        if status != PipelineStatus::Running {
            tracing::error!(pipeline_id = %self.pipeline_id, %status, "pipeline not running; refusing enqueue");
            return Err(ManagerError::Transition(format!(
                "pipeline {} is in status {status} and cannot enqueue jobs",
                self.pipeline_id
            )));
        }

        let mut jobs_to_queue: Vec<JobRun> = Vec::new();
        for job in self.pending_jobs()? {
            let job_manager = self.job_manager_for(&job.id)?;

            if self.can_enqueue_job(&job)? {
                job_manager.prepare_queue()?;
                jobs_to_queue.push(job);
                continue;
            }

            if let Some(reason) = self.unreachable_dependency_reason(&job)? {
                job_manager.skip_job(&JobResult::skipped(json!({
                    "result": reason,
                    "timestamp": self.base.clock.now(),
                })))?;
                tracing::info!(job_urn = %job.urn, reason, "skipped job with unreachable dependencies");
            }
        }

        self.flush()?;

        if jobs_to_queue.is_empty() {
            tracing::debug!(pipeline_id = %self.pipeline_id, "no ready jobs to enqueue");
            return Ok(());
        }

        let mut enqueued = Vec::new();
        for job in &jobs_to_queue {
            let defer = if job.retry_count > 0 {
                Duration::from_secs(job.retry_delay_seconds)
            } else {
                Duration::ZERO
            };
            let accepted = self
                .base
                .queue
                .enqueue(&job.job_function, &job.id, defer, &job.urn)
                .await?;
            if accepted {
                enqueued.push(job.urn.clone());
            } else {
                tracing::info!(job_urn = %job.urn, "job already enqueued; coalesced");
            }
        }
        tracing::info!(pipeline_id = %self.pipeline_id, count = enqueued.len(), ?enqueued, "enqueued ready jobs");
        Ok(())
    }

    /// Whether all of a job's dependencies are satisfied right now.
    pub fn can_enqueue_job(&self, job: &JobRun) -> Result<bool, ManagerError> {
        for (dependency, predecessor) in self.base.db.dependencies_with_predecessors(&job.id)? {
            if !dependency_is_met(dependency.dependency_type, predecessor.status) {
                tracing::debug!(job_urn = %job.urn, predecessor = %predecessor.urn, "dependency not met");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The skip reason when any dependency can no longer be satisfied.
    pub fn unreachable_dependency_reason(
        &self,
        job: &JobRun,
    ) -> Result<Option<String>, ManagerError> {
        for (dependency, predecessor) in self.base.db.dependencies_with_predecessors(&job.id)? {
            if let Some(reason) = unreachable_reason(
                dependency.dependency_type,
                predecessor.status,
                &predecessor.urn,
            ) {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Cancel all remaining active jobs: PENDING jobs are skipped, QUEUED
    /// and RUNNING jobs are cancelled.
    ///
    /// A pending job blocked by an unreachable dependency keeps the more
    /// specific skip reason naming its predecessor.
    pub fn cancel_remaining_jobs(&self, reason: &str) -> Result<(), ManagerError> {
        let remaining = self.active_jobs()?;
        if remaining.is_empty() {
            tracing::debug!(pipeline_id = %self.pipeline_id, "no jobs to cancel");
            return Ok(());
        }

        for job in remaining {
            let job_manager = self.job_manager_for(&job.id)?;
            if job.status == JobStatus::Pending {
                let skip_reason = self
                    .unreachable_dependency_reason(&job)?
                    .unwrap_or_else(|| reason.to_string());
                job_manager.skip_job(&JobResult::skipped(json!({
                    "result": skip_reason,
                    "timestamp": self.base.clock.now(),
                })))?;
                tracing::debug!(job_urn = %job.urn, reason = skip_reason, "skipped job");
            } else {
                job_manager.cancel_job(&JobResult::skipped(json!({
                    "result": reason,
                    "timestamp": self.base.clock.now(),
                })))?;
                tracing::debug!(job_urn = %job.urn, reason, "cancelled job");
            }
        }

        tracing::info!(pipeline_id = %self.pipeline_id, reason, "cancelled remaining jobs");
        Ok(())
    }

    /// Cancel the pipeline and all remaining jobs.
    pub async fn cancel_pipeline(&self, reason: &str) -> Result<(), ManagerError> {
        let status = self.pipeline_status()?;
        if TERMINAL_PIPELINE_STATUSES.contains(&status) {
            tracing::error!(pipeline_id = %self.pipeline_id, %status, "terminal pipeline may not be cancelled");
            return Err(ManagerError::Transition(format!(
                "pipeline {} is in terminal state {status} and may not be cancelled",
                self.pipeline_id
            )));
        }

        self.set_pipeline_status(PipelineStatus::Cancelled)?;
        self.flush()?;
        tracing::info!(pipeline_id = %self.pipeline_id, reason, "pipeline cancelled");

        self.coordinate_pipeline().await
    }

    /// Pause the pipeline: no new enqueues; running jobs continue.
    pub async fn pause_pipeline(&self, reason: &str) -> Result<(), ManagerError> {
        let status = self.pipeline_status()?;
        if TERMINAL_PIPELINE_STATUSES.contains(&status) {
            return Err(ManagerError::Transition(format!(
                "pipeline {} is in terminal state {status} and may not be paused",
                self.pipeline_id
            )));
        }
        if status == PipelineStatus::Paused {
            return Err(ManagerError::Transition(format!(
                "pipeline {} is already paused",
                self.pipeline_id
            )));
        }

        self.set_pipeline_status(PipelineStatus::Paused)?;
        self.flush()?;
        tracing::info!(pipeline_id = %self.pipeline_id, was = %status, reason, "pipeline paused");

        self.coordinate_pipeline().await
    }

    /// Resume a paused pipeline and enqueue ready jobs.
    pub async fn unpause_pipeline(&self, reason: &str) -> Result<(), ManagerError> {
        let status = self.pipeline_status()?;
        if status != PipelineStatus::Paused {
            tracing::error!(pipeline_id = %self.pipeline_id, %status, "pipeline not paused; may not be unpaused");
            return Err(ManagerError::Transition(format!(
                "pipeline {} is not paused (current status: {status}) and may not be unpaused",
                self.pipeline_id
            )));
        }

        self.set_pipeline_status(PipelineStatus::Running)?;
        self.flush()?;
        tracing::info!(pipeline_id = %self.pipeline_id, reason, "pipeline unpaused");

        self.coordinate_pipeline().await
    }

    /// Restart the pipeline from scratch: every job reset to PENDING, the
    /// pipeline back to CREATED, then started.
    pub async fn restart_pipeline(&self) -> Result<(), ManagerError> {
        let all_jobs = self.all_jobs()?;
        if all_jobs.is_empty() {
            tracing::debug!(pipeline_id = %self.pipeline_id, "no jobs to restart");
            return Ok(());
        }

        for job in &all_jobs {
            self.job_manager_for(&job.id)?.reset_job()?;
        }

        self.set_pipeline_status(PipelineStatus::Created)?;
        self.flush()?;
        tracing::info!(pipeline_id = %self.pipeline_id, "pipeline reset for restart");

        self.start_pipeline(true).await
    }

    /// Prepare every FAILED job for retry and resume coordination.
    pub async fn retry_failed_jobs(&self) -> Result<(), ManagerError> {
        self.retry_jobs(&[JobStatus::Failed]).await
    }

    /// Prepare every FAILED, CANCELLED, and SKIPPED job for retry and
    /// resume coordination.
    pub async fn retry_unsuccessful_jobs(&self) -> Result<(), ManagerError> {
        self.retry_jobs(RETRYABLE_JOB_STATUSES).await
    }

    async fn retry_jobs(&self, statuses: &[JobStatus]) -> Result<(), ManagerError> {
        let jobs = self.jobs_by_status(statuses)?;
        if jobs.is_empty() {
            tracing::debug!(pipeline_id = %self.pipeline_id, ?statuses, "no jobs to retry");
            return Ok(());
        }

        for job in &jobs {
            self.job_manager_for(&job.id)?.prepare_retry("retry_requested")?;
        }

        // Pipeline must be running again so retried jobs are picked up
        self.set_pipeline_status(PipelineStatus::Running)?;
        self.flush()?;

        self.coordinate_pipeline().await
    }

    // ----- queries -----

    pub fn jobs_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<JobRun>, ManagerError> {
        Ok(self
            .base
            .db
            .jobs_in_pipeline(&self.pipeline_id, Some(statuses)))
    }

    pub fn pending_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        self.jobs_by_status(&[JobStatus::Pending])
    }

    pub fn running_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        self.jobs_by_status(&[JobStatus::Running])
    }

    pub fn active_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        self.jobs_by_status(ACTIVE_JOB_STATUSES)
    }

    pub fn failed_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        self.jobs_by_status(&[JobStatus::Failed])
    }

    pub fn unsuccessful_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        self.jobs_by_status(RETRYABLE_JOB_STATUSES)
    }

    pub fn all_jobs(&self) -> Result<Vec<JobRun>, ManagerError> {
        Ok(self.base.db.jobs_in_pipeline(&self.pipeline_id, None))
    }

    pub fn job_counts_by_status(&self) -> Result<HashMap<JobStatus, usize>, ManagerError> {
        Ok(self.base.db.job_counts_by_status(&self.pipeline_id))
    }

    /// Detailed progress statistics for monitoring.
    pub fn pipeline_progress(&self) -> Result<PipelineProgress, ManagerError> {
        let counts = self.job_counts_by_status()?;
        let pipeline = self.pipeline()?;

        let total_jobs: usize = counts.values().sum();
        if total_jobs == 0 {
            return Ok(PipelineProgress {
                total_jobs: 0,
                completed_jobs: 0,
                successful_jobs: 0,
                failed_jobs: 0,
                running_jobs: 0,
                pending_jobs: 0,
                completion_percentage: 100.0,
                duration_seconds: 0,
                status_counts: counts,
            });
        }

        let count = |status: JobStatus| counts.get(&status).copied().unwrap_or(0);
        let successful_jobs = count(JobStatus::Succeeded);
        let failed_jobs = count(JobStatus::Failed);
        let completed_jobs =
            successful_jobs + failed_jobs + count(JobStatus::Skipped) + count(JobStatus::Cancelled);

        let end = pipeline.finished_at.unwrap_or_else(|| self.base.clock.now());
        let duration_seconds = (end - pipeline.created_at).num_seconds();

        Ok(PipelineProgress {
            total_jobs,
            completed_jobs,
            successful_jobs,
            failed_jobs,
            running_jobs: count(JobStatus::Running) + count(JobStatus::Queued),
            pending_jobs: count(JobStatus::Pending),
            completion_percentage: (completed_jobs as f64 / total_jobs as f64) * 100.0,
            duration_seconds,
            status_counts: counts,
        })
    }

    /// Set the pipeline status without transition validation.
    ///
    /// Stamps `finished_at` on terminal statuses and clears it otherwise;
    /// `started_at` is set on first RUNNING and cleared on CREATED. Does
    /// not flush.
    pub fn set_pipeline_status(&self, new_status: PipelineStatus) -> Result<(), ManagerError> {
        let mut pipeline = self.pipeline()?;
        pipeline.status = new_status;

        if TERMINAL_PIPELINE_STATUSES.contains(&new_status) {
            pipeline.finished_at = Some(self.base.clock.now());
        } else {
            pipeline.finished_at = None;
        }

        if new_status == PipelineStatus::Created {
            pipeline.started_at = None;
        } else if new_status == PipelineStatus::Running && pipeline.started_at.is_none() {
            pipeline.started_at = Some(self.base.clock.now());
        }

        self.base.db.upsert_pipeline(&pipeline);
        tracing::info!(pipeline_id = %self.pipeline_id, status = %new_status, "pipeline status set");
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_manager_tests.rs"]
mod tests;
