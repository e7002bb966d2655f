// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing for job functions: param extraction, follow-on job
//! spawning, and backoff re-enqueue.

use crate::context::JobContext;
use crate::error::JobError;
use mj_adapters::JobQueue as _;
use mj_core::{
    Clock as _, IdGen as _, JobId, JobRun, JobRunConfig, MappedVariant, ScoreSetId, Variant,
};
use serde_json::Value;
use std::time::Duration;

/// Ensure every required key is present in `job_params`.
pub fn validate_job_params(job: &JobRun, required: &[&str]) -> Result<(), JobError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|key| job.job_params.get(**key).is_none())
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(JobError::MissingParams(missing))
    }
}

pub fn param_str(job: &JobRun, key: &str) -> Result<String, JobError> {
    job.job_params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| JobError::MissingParams(vec![key.to_string()]))
}

pub fn param_opt_str(job: &JobRun, key: &str) -> Option<String> {
    job.job_params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn param_u32(job: &JobRun, key: &str) -> Result<u32, JobError> {
    job.job_params
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| JobError::MissingParams(vec![key.to_string()]))
}

pub fn param_value(job: &JobRun, key: &str) -> Option<Value> {
    job.job_params.get(key).cloned()
}

/// Derive the HGVS expression from a post-mapped VRS object.
pub fn hgvs_from_post_mapped(post_mapped: &Value) -> Option<String> {
    if let Some(value) = post_mapped
        .get("expressions")
        .and_then(Value::as_array)
        .and_then(|expressions| expressions.first())
        .and_then(|e| e.get("value"))
        .and_then(Value::as_str)
    {
        return Some(value.to_string());
    }
    post_mapped
        .get("hgvs")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Current mapped variants carrying a post-mapped representation, joined
/// with their variants.
pub fn current_post_mapped(
    ctx: &JobContext,
    score_set_id: &ScoreSetId,
) -> Vec<(Variant, MappedVariant)> {
    ctx.db
        .current_mapped_variants_for_score_set(score_set_id)
        .into_iter()
        .filter(|(_, mapped)| mapped.post_mapped.is_some())
        .collect()
}

/// Create and enqueue a follow-on job run for a chained step.
///
/// The new job is independent (no pipeline) and carries the given params;
/// the correlation id travels inside them.
pub async fn spawn_follow_on(
    ctx: &JobContext,
    function: &str,
    params: Value,
    defer: Duration,
) -> Result<JobId, JobError> {
    let id = JobId::new(ctx.ids.next());
    let urn = format!("urn:mavejobs:job:{id}");
    let job = JobRun::new(
        JobRunConfig::new(id.clone(), urn.clone(), function)
            .params(params)
            .max_retries(ctx.config.default_max_retries),
        ctx.clock.now(),
    );
    ctx.db.upsert_job_run(&job);
    ctx.db.flush().map_err(JobError::Store)?;

    let accepted = ctx
        .job_queue()
        .enqueue(function, &id, defer, &urn)
        .await
        .map_err(|e| JobError::Enqueue(e.to_string()))?;
    if !accepted {
        return Err(JobError::Enqueue(format!(
            "queue coalesced follow-on job {urn}"
        )));
    }

    tracing::info!(function, job_id = %id, ?defer, "enqueued follow-on job");
    Ok(id)
}

/// Re-enqueue a job for another attempt with linear backoff.
///
/// Returns `(enqueued job id, limit exceeded, defer seconds)`. Each
/// attempt gets its own queue-side id so the backoff entry is not
/// coalesced with the running instance.
pub async fn enqueue_job_with_backoff(
    ctx: &JobContext,
    job: &JobRun,
    attempt: u32,
    backoff_seconds: u64,
) -> Result<(Option<JobId>, bool, u64), JobError> {
    if attempt >= ctx.config.enqueue_backoff_attempt_limit {
        return Ok((None, true, 0));
    }

    let defer_seconds = backoff_seconds * u64::from(attempt);
    let client_job_id = format!("{}#attempt-{}", job.urn, attempt + 1);
    let accepted = ctx
        .job_queue()
        .enqueue(
            &job.job_function,
            &job.id,
            Duration::from_secs(defer_seconds),
            &client_job_id,
        )
        .await
        .map_err(|e| JobError::Enqueue(e.to_string()))?;

    if accepted {
        Ok((Some(job.id.clone()), false, defer_seconds))
    } else {
        Ok((None, false, defer_seconds))
    }
}

#[cfg(test)]
#[path = "support_tests.rs"]
mod tests;
