// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gnomAD linkage: population frequency and context for mapped variants.

use super::support::{param_str, validate_job_params};
use crate::annotation::AnnotationStatusManager;
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::GnomadClient as _;
use mj_core::{AnnotationStatus, AnnotationType, JobId, JobResult, ScoreSetId};
use serde_json::json;

/// gnomAD release the worker links against
const GNOMAD_DATA_VERSION: &str = "v4";

/// Look up gnomAD records for every current mapped variant with a CAID
/// and persist frequency/context annotations.
pub async fn link_gnomad_variants(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting gnomAD variant linkage"))?;
    tracing::info!(score_set = %score_set.urn, "started gnomAD variant linkage");

    let pairs: Vec<_> = ctx
        .db
        .current_mapped_variants_for_score_set(&score_set.id)
        .into_iter()
        .filter(|(_, mapped)| mapped.clingen_allele_id.is_some())
        .collect();

    if pairs.is_empty() {
        tracing::warn!(score_set = %score_set.urn, "no current mapped variants with CAIDs; nothing to link");
        return Ok(JobResult::ok(json!({"success": true, "linked": 0})));
    }

    let caids: Vec<String> = pairs
        .iter()
        .filter_map(|(_, m)| m.clingen_allele_id.clone())
        .collect();
    job_manager.update_progress(
        20,
        100,
        Some(&format!("Fetching gnomAD data for {} alleles", caids.len())),
    )?;

    let gnomad = ctx.clients.gnomad.clone();
    let query = caids.clone();
    let records = ctx.pool.run(move || gnomad.data_for_caids(&query)).await??;

    if records.is_empty() {
        tracing::warn!(score_set = %score_set.urn, "no gnomAD records matched; nothing to link");
        return Ok(JobResult::ok(json!({"success": true, "linked": 0})));
    }
    job_manager.update_progress(60, 100, Some("Linking gnomAD records"))?;

    let annotations =
        AnnotationStatusManager::new(ctx.db.clone(), ctx.ids.clone(), ctx.clock.clone());
    let mut linked = 0usize;
    for record in &records {
        for (variant, _) in pairs
            .iter()
            .filter(|(_, m)| m.clingen_allele_id.as_deref() == Some(record.caid.as_str()))
        {
            annotations.add_annotation(
                &variant.id,
                AnnotationType::GnomadLinkage,
                GNOMAD_DATA_VERSION,
                AnnotationStatus::Success,
                json!({
                    "job_run_id": job.id,
                    "caid": record.caid,
                    "allele_frequency": record.allele_frequency,
                    "allele_count": record.allele_count,
                    "allele_number": record.allele_number,
                    "context": record.context,
                }),
                true,
            )?;
            linked += 1;
        }
    }

    job_manager.update_progress(100, 100, Some("Completed gnomAD variant linkage"))?;
    tracing::info!(score_set = %score_set.urn, linked, "gnomAD linkage finished");

    Ok(JobResult::ok(json!({"success": true, "linked": linked})))
}

#[cfg(test)]
#[path = "gnomad_tests.rs"]
mod tests;
