// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline-management bracket around every job function invocation.
//!
//! Dispatch is the sole component that commits: once after the RUNNING
//! transition, once for the job's terminal outcome (capturing the job
//! function's domain mutations and the terminal transition atomically),
//! and once after pipeline coordination. Job function errors are recorded
//! as failed results and re-raised only after state has been committed.

use crate::context::JobContext;
use crate::error::JobError;
use crate::registry::JobRegistry;
use mj_core::{ExceptionDetails, JobId, JobResult, JobStatus};
use serde_json::json;

fn commit(ctx: &JobContext) -> Result<(), JobError> {
    ctx.db.commit().map_err(JobError::Store)
}

/// Run one dequeued job function under pipeline management.
pub async fn dispatch(
    ctx: &JobContext,
    registry: &JobRegistry,
    function: &str,
    job_id: &JobId,
) -> Result<JobResult, JobError> {
    let job_manager = ctx.job_manager(job_id)?;
    let pipeline_manager = match job_manager.pipeline_id()? {
        Some(pipeline_id) => Some(ctx.pipeline_manager(&pipeline_id)?),
        None => None,
    };

    // A FAILED job can only be redelivered by an explicit backoff
    // re-enqueue; bring it back to PENDING before starting.
    if job_manager.job_status()? == JobStatus::Failed {
        job_manager.prepare_retry("redelivered for retry")?;
    }

    let Some(job_fn) = registry.get(function) else {
        let error = JobError::UnknownFunction(function.to_string());
        let result = JobResult::failed(
            json!({}),
            ExceptionDetails::new(error.kind(), error.to_string()),
        );
        job_manager.fail_job(&error, &result)?;
        commit(ctx)?;
        if let Some(pipeline_manager) = &pipeline_manager {
            pipeline_manager.coordinate_pipeline().await?;
            commit(ctx)?;
        }
        return Err(error);
    };

    if let Err(e) = job_manager.start_job() {
        ctx.db.rollback();
        return Err(e.into());
    }
    commit(ctx)?;

    let outcome = job_fn(ctx.clone(), job_id.clone(), job_manager.clone()).await;

    let (result, error) = match outcome {
        Ok(result) => {
            match &result {
                JobResult::Ok { .. } => job_manager.succeed_job(&result)?,
                JobResult::Error { .. } | JobResult::Failed { .. } => {
                    job_manager.fail_job_from_result(&result)?
                }
                JobResult::Skipped { .. } => job_manager.skip_job(&result)?,
            }
            (result, None)
        }
        Err(error) => {
            let result = JobResult::failed(
                json!({}),
                ExceptionDetails::new(error.kind(), error.to_string()),
            );
            job_manager.fail_job(&error, &result)?;
            (result, Some(error))
        }
    };
    commit(ctx)?;

    if let Some(pipeline_manager) = &pipeline_manager {
        pipeline_manager.coordinate_pipeline().await?;
        commit(ctx)?;
    }

    match error {
        // Re-raise only now that every state change is durable
        Some(error) => Err(error),
        None => Ok(result),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
