// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClinVar clinical-control refresh for a score set's mapped variants.

use super::support::{param_str, validate_job_params};
use crate::annotation::AnnotationStatusManager;
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::{
    parse_variant_summary, validate_variant_summary_date, AlleleRegistry as _, ClientError,
    ClinvarClient as _,
};
use mj_core::{
    AnnotationStatus, AnnotationType, ClinicalControl, ControlId, IdGen as _, JobId, JobResult,
    ScoreSetId,
};
use serde_json::json;

fn param_int(job: &mj_core::JobRun, key: &str) -> Result<i64, JobError> {
    job.job_params
        .get(key)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| JobError::MissingParams(vec![key.to_string()]))
}

/// Refresh ClinVar clinical controls from one monthly snapshot.
///
/// For each current mapped variant, resolves CAID → ClinVar allele id via
/// ClinGen, upserts a `ClinicalControl` row versioned `MM_YYYY`, links it
/// to the mapped variant, and records the per-variant outcome through the
/// annotation status manager.
pub async fn refresh_clinvar_controls(
    ctx: JobContext,
    job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id", "year", "month"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let year = param_int(&job, "year")? as i32;
    let month = param_int(&job, "month")? as u32;
    let score_set = ctx.db.score_set(&score_set_id)?;

    validate_variant_summary_date(month, year)?;
    // Version must be in MM_YYYY format
    let clinvar_version = format!("{month:02}_{year}");

    job_manager.update_progress(
        0,
        100,
        Some(&format!(
            "Starting ClinVar clinical control refresh for version {clinvar_version}"
        )),
    )?;
    tracing::info!(score_set = %score_set.urn, clinvar_version, "started ClinVar clinical control refresh");

    job_manager.update_progress(1, 100, Some("Fetching ClinVar variant summary TSV data"))?;
    let clinvar = ctx.clients.clinvar.clone();
    let tsv = ctx
        .pool
        .run(move || clinvar.variant_summary_tsv(month, year))
        .await??;
    let tsv_data = parse_variant_summary(&tsv)?;
    job_manager.update_progress(10, 100, Some("Fetched and parsed ClinVar variant summary"))?;

    let pairs = ctx.db.current_mapped_variants_for_score_set(&score_set.id);
    let total = pairs.len();
    tracing::info!(score_set = %score_set.urn, total, "refreshing ClinVar data for mapped variants");

    let annotations =
        AnnotationStatusManager::new(ctx.db.clone(), ctx.ids.clone(), ctx.clock.clone());

    for (index, (_, mapped_variant)) in pairs.iter().enumerate() {
        if index % 25 == 0 {
            if job_manager.is_cancelled()? {
                tracing::info!(score_set = %score_set.urn, "ClinVar refresh cancelled; stopping");
                break;
            }
            if total > 0 {
                job_manager.update_progress(
                    10 + ((index * 90) / total) as u32,
                    100,
                    Some(&format!(
                        "Refreshing ClinVar data for {total} variants ({index} completed)"
                    )),
                )?;
            }
        }

        let Some(clingen_id) = mapped_variant.clingen_allele_id.clone() else {
            annotations.add_annotation(
                &mapped_variant.variant_id,
                AnnotationType::ClinvarControl,
                &clinvar_version,
                AnnotationStatus::Skipped,
                json!({
                    "job_run_id": job_id,
                    "error_message": "Mapped variant does not have an associated ClinGen allele ID.",
                    "failure_category": "missing_clingen_allele_id",
                }),
                true,
            )?;
            continue;
        };

        if clingen_id.contains(',') {
            annotations.add_annotation(
                &mapped_variant.variant_id,
                AnnotationType::ClinvarControl,
                &clinvar_version,
                AnnotationStatus::Skipped,
                json!({
                    "job_run_id": job_id,
                    "error_message": "Multi-variant ClinGen allele IDs cannot be associated with ClinVar data.",
                    "failure_category": "multi_variant_clingen_allele_id",
                }),
                true,
            )?;
            tracing::debug!(caid = %clingen_id, "multi-variant ClinGen allele ID; skipping");
            continue;
        }

        let registry = ctx.clients.allele_registry.clone();
        let lookup_id = clingen_id.clone();
        let clinvar_allele_id = match ctx
            .pool
            .run(move || registry.associated_clinvar_allele_id(&lookup_id))
            .await?
        {
            Ok(id) => id,
            Err(e @ (ClientError::Network(_)
            | ClientError::Timeout(_)
            | ClientError::ServiceUnavailable(_)
            | ClientError::InvalidResponse(_))) => {
                annotations.add_annotation(
                    &mapped_variant.variant_id,
                    AnnotationType::ClinvarControl,
                    &clinvar_version,
                    AnnotationStatus::Failed,
                    json!({
                        "job_run_id": job_id,
                        "error_message": format!("Failed to retrieve ClinVar allele ID from ClinGen API: {e}"),
                        "failure_category": "clingen_api_error",
                    }),
                    true,
                )?;
                tracing::error!(caid = %clingen_id, error = %e, "ClinGen API lookup failed");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let Some(clinvar_allele_id) = clinvar_allele_id else {
            annotations.add_annotation(
                &mapped_variant.variant_id,
                AnnotationType::ClinvarControl,
                &clinvar_version,
                AnnotationStatus::Skipped,
                json!({
                    "job_run_id": job_id,
                    "error_message": "No ClinVar allele ID found for ClinGen allele ID.",
                    "failure_category": "no_associated_clinvar_allele_id",
                }),
                true,
            )?;
            continue;
        };

        let Some(variant_data) = tsv_data.get(&clinvar_allele_id) else {
            annotations.add_annotation(
                &mapped_variant.variant_id,
                AnnotationType::ClinvarControl,
                &clinvar_version,
                AnnotationStatus::Skipped,
                json!({
                    "job_run_id": job_id,
                    "error_message": "No ClinVar data found for ClinVar allele ID.",
                    "failure_category": "no_clinvar_variant_data",
                }),
                true,
            )?;
            continue;
        };

        // Upsert the control row for this snapshot version
        let control = match ctx
            .db
            .clinical_control_by("ClinVar", &clinvar_allele_id, &clinvar_version)
        {
            Some(mut existing) => {
                existing.gene_symbol = variant_data.gene_symbol.clone();
                existing.clinical_significance = variant_data.clinical_significance.clone();
                existing.clinical_review_status = variant_data.review_status.clone();
                existing
            }
            None => ClinicalControl {
                id: ControlId::new(ctx.ids.next()),
                db_name: "ClinVar".to_string(),
                db_identifier: clinvar_allele_id.clone(),
                db_version: clinvar_version.clone(),
                gene_symbol: variant_data.gene_symbol.clone(),
                clinical_significance: variant_data.clinical_significance.clone(),
                clinical_review_status: variant_data.review_status.clone(),
            },
        };
        ctx.db.upsert_clinical_control(&control);
        ctx.db.link_clinical_control(&mapped_variant.id, &control.id);
        ctx.db.flush().map_err(JobError::Store)?;

        annotations.add_annotation(
            &mapped_variant.variant_id,
            AnnotationType::ClinvarControl,
            &clinvar_version,
            AnnotationStatus::Success,
            json!({
                "job_run_id": job_id,
                "success_data": {"clinvar_allele_id": clinvar_allele_id},
            }),
            true,
        )?;
    }

    job_manager.update_progress(100, 100, Some("Completed ClinVar clinical control refresh"))?;
    tracing::info!(score_set = %score_set.urn, clinvar_version, "ClinVar clinical control refresh finished");

    Ok(JobResult::ok(json!({"clinvar_version": clinvar_version})))
}

#[cfg(test)]
#[path = "clinvar_tests.rs"]
mod tests;
