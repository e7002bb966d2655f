// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClinGen integration: allele registry submission, LDH submission, and
//! variant linkage.

use super::support::{
    current_post_mapped, enqueue_job_with_backoff, hgvs_from_post_mapped, param_opt_str,
    param_str, param_u32, spawn_follow_on, validate_job_params,
};
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::{
    clingen_allele_id_from_variation, AlleleRegistry as _, LdhClient as _, LdhSubmission,
};
use mj_core::{ExceptionDetails, JobId, JobResult, ScoreSetId};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

fn chain_result(success: bool, retried: bool, enqueued_job: Option<&JobId>) -> Value {
    json!({
        "success": success,
        "retried": retried,
        "enqueued_job": enqueued_job.map(|id| id.to_string()),
    })
}

/// Submit the unique post-mapped HGVS strings of a score set's current
/// mapped variants to the ClinGen Allele Registry, write the returned
/// CAIDs back, and chain the LDH submission job.
pub async fn submit_score_set_mappings_to_car(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let correlation_id = param_opt_str(&job, "correlation_id");
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting allele registry submission"))?;
    tracing::info!(score_set = %score_set.urn, "started allele registry submission");

    if !ctx.config.car_submission_active() {
        tracing::warn!(score_set = %score_set.urn, "allele registry submission disabled; skipping");
        return Ok(JobResult::ok(chain_result(false, false, None)));
    }

    // Unique HGVS strings, each owning the mapped variants it covers
    let mut hgvs_to_mapped: HashMap<String, Vec<mj_core::MappedVariant>> = HashMap::new();
    for (_, mapped) in current_post_mapped(&ctx, &score_set.id) {
        let Some(post_mapped) = &mapped.post_mapped else {
            continue;
        };
        let Some(hgvs) = hgvs_from_post_mapped(post_mapped) else {
            tracing::warn!(mapped_variant = %mapped.id, "no valid HGVS for mapped variant; skipping");
            continue;
        };
        hgvs_to_mapped.entry(hgvs).or_default().push(mapped);
    }

    if hgvs_to_mapped.is_empty() {
        tracing::warn!(score_set = %score_set.urn, "no current mapped variants with post-mapped data; skipping submission");
        return Ok(JobResult::ok(chain_result(true, false, None)));
    }

    let mut hgvs_list: Vec<String> = hgvs_to_mapped.keys().cloned().collect();
    hgvs_list.sort_unstable();
    job_manager.update_progress(
        20,
        100,
        Some(&format!("Submitting {} alleles", hgvs_list.len())),
    )?;

    let registry = ctx.clients.allele_registry.clone();
    let submission = hgvs_list.clone();
    let registered = ctx
        .pool
        .run(move || registry.dispatch_submissions(&submission))
        .await??;
    job_manager.update_progress(70, 100, Some("Associating registered alleles"))?;

    for allele in &registered {
        let Some(caid) = &allele.clingen_allele_id else {
            continue;
        };
        let Some(mapped_variants) = hgvs_to_mapped.get(&allele.hgvs) else {
            continue;
        };
        for mapped in mapped_variants {
            let mut mapped = mapped.clone();
            mapped.clingen_allele_id = Some(caid.clone());
            ctx.db.upsert_mapped_variant(&mapped);
        }
    }
    ctx.db.flush().map_err(JobError::Store)?;

    let follow_on = spawn_follow_on(
        &ctx,
        "submit_score_set_mappings_to_ldh",
        json!({
            "score_set_id": score_set.id,
            "correlation_id": correlation_id,
        }),
        Duration::ZERO,
    )
    .await?;

    job_manager.update_progress(100, 100, Some("Completed allele registry submission"))?;
    Ok(JobResult::ok(chain_result(true, false, Some(&follow_on))))
}

/// Build LDH submission documents from (variant, mapped variant, hgvs)
/// triples and dispatch them in batches; zero failures required. Chains
/// the linkage job with the fixed linking backoff.
pub async fn submit_score_set_mappings_to_ldh(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let correlation_id = param_opt_str(&job, "correlation_id");
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting LDH submission"))?;
    tracing::info!(score_set = %score_set.urn, "started LDH submission");

    if !ctx.config.ldh_submission_active() {
        tracing::warn!(score_set = %score_set.urn, "LDH submission disabled; skipping");
        return Ok(JobResult::ok(chain_result(false, false, None)));
    }

    let ldh = ctx.clients.ldh.clone();
    ctx.pool.run(move || ldh.authenticate()).await??;

    let mut submissions = Vec::new();
    for (variant, mapped) in current_post_mapped(&ctx, &score_set.id) {
        let Some(post_mapped) = &mapped.post_mapped else {
            continue;
        };
        let Some(hgvs) = hgvs_from_post_mapped(post_mapped) else {
            tracing::warn!(mapped_variant = %mapped.id, "no valid HGVS for mapped variant; skipping");
            continue;
        };
        submissions.push(LdhSubmission {
            variant_urn: variant.urn,
            mapped_variant_id: mapped.id.to_string(),
            hgvs,
        });
    }

    if submissions.is_empty() {
        tracing::warn!(score_set = %score_set.urn, "no current mapped variants with post-mapped data; skipping submission");
        return Ok(JobResult::ok(chain_result(true, false, None)));
    }

    job_manager.update_progress(
        30,
        100,
        Some(&format!("Dispatching {} submissions", submissions.len())),
    )?;

    let ldh = ctx.clients.ldh.clone();
    let batch_size = ctx.config.default_ldh_submission_batch_size;
    let batch = submissions.clone();
    let (successes, failures) = ctx
        .pool
        .run(move || ldh.dispatch_submissions(&batch, batch_size))
        .await??;

    if !failures.is_empty() {
        tracing::error!(
            score_set = %score_set.urn,
            failures = failures.len(),
            "LDH submission dispatch failed"
        );
        return Err(JobError::Submission(format!(
            "{} submissions failed to be dispatched to the LDH",
            failures.len()
        )));
    }
    tracing::info!(score_set = %score_set.urn, successes, "dispatched all LDH submissions");
    job_manager.update_progress(80, 100, Some("Dispatched all submissions"))?;

    let follow_on = spawn_follow_on(
        &ctx,
        "link_clingen_variants",
        json!({
            "score_set_id": score_set.id,
            "correlation_id": correlation_id,
            "attempt": 1,
        }),
        Duration::from_secs(ctx.config.linking_backoff_in_seconds),
    )
    .await?;

    job_manager.update_progress(100, 100, Some("Completed LDH submission"))?;
    Ok(JobResult::ok(chain_result(true, false, Some(&follow_on))))
}

/// Link current mapped variants to their ClinGen variations by CAID.
///
/// If the linkage failure ratio exceeds the retry threshold, the job
/// re-enqueues itself with `attempt + 1` and linear backoff, up to the
/// attempt limit; otherwise the gnomAD linkage job is chained.
pub async fn link_clingen_variants(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id", "attempt"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let correlation_id = param_opt_str(&job, "correlation_id");
    let attempt = param_u32(&job, "attempt")?;
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting ClinGen variant linkage"))?;
    tracing::info!(
        score_set = %score_set.urn,
        attempt,
        max_attempts = ctx.config.enqueue_backoff_attempt_limit,
        threshold = ctx.config.linked_data_retry_threshold,
        "started ClinGen variant linkage"
    );

    let pairs = current_post_mapped(&ctx, &score_set.id);
    if pairs.is_empty() {
        tracing::warn!(
            score_set = %score_set.urn,
            "no current mapped variants with post-mapped data; nothing to link and no gnomAD job will be enqueued"
        );
        return Ok(JobResult::ok(chain_result(true, false, None)));
    }

    let urns: Vec<String> = pairs.iter().map(|(v, _)| v.urn.clone()).collect();
    let total = urns.len();
    job_manager.set_progress_total(total as u32, Some("Fetching ClinGen variations"))?;

    let ldh = ctx.clients.ldh.clone();
    let fetch_urns = urns.clone();
    let linked: Vec<(String, Option<Value>)> = ctx
        .pool
        .run(move || {
            fetch_urns
                .into_iter()
                .map(|urn| {
                    let variation = ldh.clingen_variation(&urn).unwrap_or_else(|e| {
                        tracing::warn!(variant_urn = %urn, error = %e, "ClinGen variation fetch failed");
                        None
                    });
                    (urn, variation)
                })
                .collect()
        })
        .await?;

    let mut linkage_failures: Vec<String> = Vec::new();
    for (index, (urn, variation)) in linked.iter().enumerate() {
        job_manager.update_progress(index as u32, total as u32, None)?;

        let caid = variation
            .as_ref()
            .and_then(clingen_allele_id_from_variation);
        let Some(caid) = caid else {
            tracing::warn!(variant_urn = %urn, "no LDH variation found; linkage failed");
            linkage_failures.push(urn.clone());
            continue;
        };

        let Some((_, mapped)) = pairs.iter().find(|(v, _)| v.urn == *urn) else {
            linkage_failures.push(urn.clone());
            continue;
        };
        let mut mapped = mapped.clone();
        mapped.clingen_allele_id = Some(caid);
        ctx.db.upsert_mapped_variant(&mapped);
    }
    ctx.db.flush().map_err(JobError::Store)?;

    let failure_ratio = linkage_failures.len() as f64 / total as f64;
    tracing::info!(
        score_set = %score_set.urn,
        failures = linkage_failures.len(),
        successes = total - linkage_failures.len(),
        failure_ratio,
        "ClinGen linkage pass finished"
    );

    if linkage_failures.is_empty() || failure_ratio < ctx.config.linked_data_retry_threshold {
        let follow_on = spawn_follow_on(
            &ctx,
            "link_gnomad_variants",
            json!({
                "score_set_id": score_set.id,
                "correlation_id": correlation_id,
            }),
            Duration::ZERO,
        )
        .await?;
        job_manager.update_progress(total as u32, total as u32, Some("Completed ClinGen linkage"))?;
        return Ok(JobResult::ok(chain_result(true, false, Some(&follow_on))));
    }

    // Over threshold: schedule another attempt of this job before failing
    let mut job = job_manager.job()?;
    if let Some(params) = job.job_params.as_object_mut() {
        params.insert("attempt".to_string(), json!(attempt + 1));
    }
    ctx.db.upsert_job_run(&job);
    ctx.db.flush().map_err(JobError::Store)?;

    let (enqueued_job, limit_exceeded, defer_seconds) = enqueue_job_with_backoff(
        &ctx,
        &job,
        attempt,
        ctx.config.linking_backoff_in_seconds,
    )
    .await?;

    let message = format!(
        "failed to link {} of {} mapped variants ({}% of total)",
        linkage_failures.len(),
        total,
        (failure_ratio * 100.0).round()
    );
    if limit_exceeded {
        tracing::error!(score_set = %score_set.urn, attempt, "linkage retry limit exceeded; remaining failures will not be retried");
    } else if enqueued_job.is_some() {
        tracing::warn!(
            score_set = %score_set.urn,
            attempt,
            defer_seconds,
            "linkage failures exceeded threshold; scheduled another attempt"
        );
    } else {
        tracing::error!(score_set = %score_set.urn, attempt, "could not schedule another linkage attempt");
    }

    Ok(JobResult::Failed {
        data: chain_result(false, enqueued_job.is_some(), enqueued_job.as_ref()),
        exception: Some(ExceptionDetails::new("linking_error", message)),
    })
}

#[cfg(test)]
#[path = "clingen_tests.rs"]
mod tests;
