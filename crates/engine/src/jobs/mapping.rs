// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VRS mapping of a score set's variants.

use super::support::{param_str, validate_job_params};
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::VariantMapper as _;
use mj_core::{
    Clock as _, IdGen as _, JobId, JobResult, MappedVariant, MappedVariantId, MappingState,
    ScoreSetId,
};
use serde_json::json;

/// Map every variant in a score set through the external VRS mapper.
///
/// Partial success is a valid terminal outcome (mapping_state
/// INCOMPLETE); a run where no variant maps sets mapping_state FAILED but
/// still reports an ok-status result. Missing results, scores, or
/// reference metadata in the mapping document are distinct fatal errors.
pub async fn map_variants_for_score_set(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id"])?;

    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let mut score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting variant mapping"))?;
    tracing::info!(score_set = %score_set.urn, "started variant mapping");

    score_set.mapping_state = Some(MappingState::Processing);
    ctx.db.upsert_score_set(&score_set);
    ctx.db.flush().map_err(JobError::Store)?;

    let mapper = ctx.clients.mapper.clone();
    let urn = score_set.urn.clone();
    let response = match ctx.pool.run(move || mapper.map_score_set(&urn)).await? {
        Ok(response) => response,
        Err(e) => {
            score_set.mapping_state = Some(MappingState::Failed);
            ctx.db.upsert_score_set(&score_set);
            ctx.db.flush().map_err(JobError::Store)?;
            return Err(e.into());
        }
    };
    job_manager.update_progress(10, 100, Some("Received mapping results"))?;

    let detail = response
        .error_message
        .clone()
        .unwrap_or_else(|| score_set.urn.clone());

    let mut mark_failed = || -> Result<(), JobError> {
        score_set.mapping_state = Some(MappingState::Failed);
        ctx.db.upsert_score_set(&score_set);
        ctx.db.flush().map_err(JobError::Store)
    };
    if response.mapped_scores.is_empty() && response.reference_sequences.is_empty() {
        mark_failed()?;
        return Err(JobError::NonexistentMappingResults(detail));
    }
    if response.mapped_scores.is_empty() {
        mark_failed()?;
        return Err(JobError::NonexistentMappingScores(detail));
    }
    if response.reference_sequences.is_empty() {
        mark_failed()?;
        return Err(JobError::NonexistentMappingReference(detail));
    }

    // Reference metadata per target gene, keyed by annotation layer
    let mut genes = ctx.db.target_genes_for(&score_set.id);
    for gene in &mut genes {
        if let Some(reference) = response.reference_sequences.get(gene.id.as_str()) {
            gene.pre_mapped_metadata = reference.pre_mapped.clone();
            gene.post_mapped_metadata = reference.post_mapped.clone();
            ctx.db.upsert_target_gene(gene);
        }
    }
    ctx.db.flush().map_err(JobError::Store)?;

    let total = response.mapped_scores.len();
    let mut mapped_count = 0usize;
    let mut failed_count = 0usize;

    for (index, score) in response.mapped_scores.iter().enumerate() {
        if index % 50 == 0 {
            if job_manager.is_cancelled()? {
                tracing::info!(score_set = %score_set.urn, "mapping cancelled; stopping");
                break;
            }
            job_manager.update_progress(
                10 + ((index * 90) / total.max(1)) as u32,
                100,
                Some(&format!("Mapped {index}/{total} variants")),
            )?;
        }

        let Ok(variant) = ctx.db.variant_by_urn(&score.variant_urn) else {
            tracing::warn!(variant_urn = %score.variant_urn, "mapped score references unknown variant");
            failed_count += 1;
            continue;
        };
        if score.post_mapped.is_none() || score.error_message.is_some() {
            failed_count += 1;
            continue;
        }

        // One current mapping per variant: flip the old current before
        // inserting the replacement
        for mut prior in ctx
            .db
            .mapped_variants_for_variant(&variant.id)
            .into_iter()
            .filter(|m| m.current)
        {
            prior.current = false;
            ctx.db.upsert_mapped_variant(&prior);
        }
        ctx.db.upsert_mapped_variant(&MappedVariant {
            id: MappedVariantId::new(ctx.ids.next()),
            variant_id: variant.id.clone(),
            pre_mapped: score.pre_mapped.clone(),
            post_mapped: score.post_mapped.clone(),
            current: true,
            mapped_date: ctx.clock.now(),
            vrs_version: response.vrs_version.clone(),
            clingen_allele_id: None,
            error_message: None,
        });
        ctx.db.flush().map_err(JobError::Store)?;
        mapped_count += 1;
    }

    score_set.mapping_state = Some(if failed_count == 0 {
        MappingState::Complete
    } else if mapped_count > 0 {
        MappingState::Incomplete
    } else {
        MappingState::Failed
    });
    ctx.db.upsert_score_set(&score_set);
    ctx.db.flush().map_err(JobError::Store)?;

    job_manager.update_progress(
        100,
        100,
        Some(&format!("Mapped {mapped_count}/{total} variants")),
    )?;
    tracing::info!(
        score_set = %score_set.urn,
        mapped = mapped_count,
        failed = failed_count,
        "variant mapping finished"
    );

    Ok(JobResult::ok(json!({
        "mapped": mapped_count,
        "failed": failed_count,
        "score_set": score_set.urn,
    })))
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
