// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variant creation from staged score/count uploads.

use super::support::{param_opt_str, param_str, param_value, validate_job_params};
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::{ObjectStore as _, ScoreDataParser as _};
use mj_core::{
    IdGen as _, JobId, JobResult, MappingState, ProcessingState, ScoreSet, ScoreSetId, Variant,
    VariantId,
};
use serde_json::{json, Value};

/// Mark the score set failed for external observers.
///
/// The same commit that records the job's terminal transition persists
/// these states, so observers never see them diverge.
fn record_processing_failure(
    ctx: &JobContext,
    score_set: &mut ScoreSet,
    message: &str,
    detail: Option<Value>,
) -> Result<(), JobError> {
    score_set.processing_state = Some(ProcessingState::Failed);
    score_set.mapping_state = Some(MappingState::NotAttempted);
    score_set.processing_errors = Some(json!({
        "error": message,
        "detail": detail,
    }));
    ctx.db.upsert_score_set(score_set);
    ctx.db.flush().map_err(JobError::Store)?;
    Ok(())
}

/// Replace all variants attached to a score set from staged uploads.
///
/// Progress: 0 at start, 10 after metadata validation, 80 after data
/// validation, 100 once the new variants are in place.
pub async fn create_variants_for_score_set(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(
        &job,
        &["score_set_id", "scores_file_key", "score_columns_metadata"],
    )?;

    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let scores_file_key = param_str(&job, "scores_file_key")?;
    let counts_file_key = param_opt_str(&job, "counts_file_key");
    let score_columns = param_value(&job, "score_columns_metadata").unwrap_or(Value::Null);
    let count_columns = param_value(&job, "count_columns_metadata");

    let mut score_set = ctx.db.score_set(&score_set_id)?;
    job_manager.update_progress(0, 100, Some("Starting variant creation"))?;
    tracing::info!(score_set = %score_set.urn, "started variant creation");

    score_set.processing_state = Some(ProcessingState::Processing);
    ctx.db.upsert_score_set(&score_set);
    ctx.db.flush().map_err(JobError::Store)?;

    if ctx.db.target_genes_for(&score_set.id).is_empty() {
        let message = format!("score set {} has no target genes", score_set.urn);
        tracing::error!(score_set = %score_set.urn, "no target genes; variant creation cannot proceed");
        record_processing_failure(&ctx, &mut score_set, &message, None)?;
        return Err(JobError::Validation(message));
    }

    if let Err(e) = ctx
        .clients
        .scores
        .validate_column_metadata(&score_columns, count_columns.as_ref())
    {
        record_processing_failure(
            &ctx,
            &mut score_set,
            "invalid column metadata",
            Some(json!(e.to_string())),
        )?;
        return Err(e.into());
    }
    job_manager.update_progress(10, 100, Some("Validated column metadata"))?;

    let objects = ctx.clients.objects.clone();
    let bucket = ctx.config.uploads_bucket.clone();
    let key = scores_file_key.clone();
    let scores_bytes = match ctx.pool.run(move || objects.download(&bucket, &key)).await? {
        Ok(bytes) => bytes,
        Err(e) => {
            record_processing_failure(
                &ctx,
                &mut score_set,
                "could not fetch staged scores file",
                Some(json!(e.to_string())),
            )?;
            return Err(e.into());
        }
    };
    let counts_bytes = match &counts_file_key {
        Some(counts_key) => {
            let objects = ctx.clients.objects.clone();
            let bucket = ctx.config.uploads_bucket.clone();
            let key = counts_key.clone();
            match ctx.pool.run(move || objects.download(&bucket, &key)).await? {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    record_processing_failure(
                        &ctx,
                        &mut score_set,
                        "could not fetch staged counts file",
                        Some(json!(e.to_string())),
                    )?;
                    return Err(e.into());
                }
            }
        }
        None => None,
    };

    let parser = ctx.clients.scores.clone();
    let score_columns_for_parse = score_columns.clone();
    let count_columns_for_parse = count_columns.clone();
    let parsed = ctx
        .pool
        .run(move || {
            parser.standardize(
                &scores_bytes,
                counts_bytes.as_deref(),
                &score_columns_for_parse,
                count_columns_for_parse.as_ref(),
            )
        })
        .await?;
    let rows = match parsed {
        Ok(rows) => rows,
        Err(e) => {
            record_processing_failure(
                &ctx,
                &mut score_set,
                "variant data failed validation",
                Some(json!(e.to_string())),
            )?;
            return Err(e.into());
        }
    };
    job_manager.update_progress(80, 100, Some("Validated variant data"))?;

    // Replace-all: prior variants (and their mapped rows) go away with
    // this score set's new upload.
    ctx.db.delete_variants_for_score_set(&score_set.id);
    for (index, row) in rows.iter().enumerate() {
        ctx.db.upsert_variant(&Variant {
            id: VariantId::new(ctx.ids.next()),
            urn: format!("{}#{}", score_set.urn, index + 1),
            score_set_id: score_set.id.clone(),
            data: row.data.clone(),
        });
    }

    score_set.processing_state = Some(ProcessingState::Success);
    score_set.mapping_state = Some(MappingState::Queued);
    score_set.processing_errors = None;
    ctx.db.upsert_score_set(&score_set);
    ctx.db.flush().map_err(JobError::Store)?;

    job_manager.update_progress(
        100,
        100,
        Some(&format!("Created {} variants", rows.len())),
    )?;
    tracing::info!(score_set = %score_set.urn, variants = rows.len(), "variant creation complete");

    Ok(JobResult::ok(json!({
        "variants_created": rows.len(),
        "score_set": score_set.urn,
    })))
}

#[cfg(test)]
#[path = "variants_tests.rs"]
mod tests;
