// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UniProt ID-mapping submission and polling.
//!
//! Submissions are asynchronous on UniProt's side: the submit job records
//! remote job ids into its dependent poll job's params, and the poll job
//! retrieves results once they are ready.

use super::support::{param_str, validate_job_params};
use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_adapters::{extract_uniprot_ids, infer_db_name_from_accession, UniprotClient as _};
use mj_core::{AnnotationLayer, JobId, JobResult, ScoreSetId, TargetGene};
use serde_json::{json, Map, Value};

/// Accession ids recorded in a target gene's post-mapped metadata.
fn accessions_from_post_mapped_metadata(gene: &TargetGene) -> Vec<String> {
    let mut accessions: Vec<String> = [
        AnnotationLayer::Genomic,
        AnnotationLayer::Cdna,
        AnnotationLayer::Protein,
    ]
    .iter()
    .filter_map(|layer| gene.post_mapped_metadata.get(layer))
    .filter_map(|metadata| metadata.get("sequence_accession"))
    .filter_map(Value::as_str)
    .map(str::to_string)
    .collect();
    accessions.sort_unstable();
    accessions.dedup();
    accessions
}

/// Submit one UniProt ID-mapping job per target gene carrying exactly one
/// post-mapped accession, then record the remote job ids on the dependent
/// poll job's params.
///
/// Without the poll job the submitted mappings are never retrieved, so a
/// missing or ambiguous dependent is an error.
pub async fn submit_uniprot_mapping_jobs_for_score_set(
    ctx: JobContext,
    job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let mut job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting UniProt mapping job submission"))?;
    tracing::info!(score_set = %score_set.urn, "started UniProt mapping job submission");

    // Preset submitted jobs metadata so it persists even when no jobs end
    // up being submitted
    job.metadata
        .insert("submitted_jobs".to_string(), json!({}));
    ctx.db.upsert_job_run(&job);
    ctx.db.flush().map_err(JobError::Store)?;

    let genes = ctx.db.target_genes_for(&score_set.id);
    if genes.is_empty() {
        job_manager.update_progress(
            100,
            100,
            Some("No target genes found; skipped UniProt mapping job submission"),
        )?;
        tracing::error!(score_set = %score_set.urn, "no target genes; skipped UniProt submission");
        return Ok(JobResult::empty());
    }

    let total = genes.len();
    let mut mapping_jobs = Map::new();
    for (index, gene) in genes.iter().enumerate() {
        let accessions = accessions_from_post_mapped_metadata(gene);
        if accessions.is_empty() {
            tracing::warn!(target_gene = %gene.id, "no accession ids in post-mapped metadata; skipped");
            continue;
        }
        if accessions.len() != 1 {
            tracing::warn!(target_gene = %gene.id, count = accessions.len(), "multiple accession ids; skipped");
            continue;
        }

        let accession = accessions[0].clone();
        let from_db = infer_db_name_from_accession(&accession).to_string();
        let uniprot = ctx.clients.uniprot.clone();
        let submit_accession = accession.clone();
        let remote_job_id = ctx
            .pool
            .run(move || {
                uniprot.submit_id_mapping(&from_db, "UniProtKB", &[submit_accession])
            })
            .await??;

        mapping_jobs.insert(
            gene.id.to_string(),
            json!({"job_id": remote_job_id, "accession": accession}),
        );
        job_manager.update_progress(
            (((index + 1) * 95) / total) as u32,
            100,
            Some(&format!("Submitted UniProt mapping job for {}", gene.name)),
        )?;
        tracing::info!(target_gene = %gene.id, "submitted UniProt ID-mapping job");
    }

    // Keep the submitted ids on this job for auditing; refetch so the
    // progress fields written during the loop are not clobbered
    let mut job = job_manager.job()?;
    job.metadata
        .insert("submitted_jobs".to_string(), Value::Object(mapping_jobs.clone()));
    ctx.db.upsert_job_run(&job);
    ctx.db.flush().map_err(JobError::Store)?;

    if mapping_jobs.is_empty() {
        job_manager.update_progress(100, 100, Some("No UniProt mapping jobs were submitted"))?;
        tracing::warn!(score_set = %score_set.urn, "no UniProt mapping jobs were submitted");
        return Ok(JobResult::empty());
    }

    // The submit job is responsible for handing the ids to its poll job
    let dependents: Vec<_> = ctx
        .db
        .dependents_of(&job_id)
        .into_iter()
        .filter(|(_, dependent)| {
            dependent.job_function == "poll_uniprot_mapping_jobs_for_score_set"
        })
        .collect();
    if dependents.len() != 1 {
        job_manager.update_progress(100, 100, Some("Failed to hand off UniProt mapping jobs"))?;
        tracing::error!(
            score_set = %score_set.urn,
            dependents = dependents.len(),
            "could not find unique dependent polling job"
        );
        return Err(JobError::Submission(format!(
            "could not find unique dependent polling job for UniProt mapping job {job_id}"
        )));
    }

    if let Some((_, mut polling_job)) = dependents.into_iter().next() {
        if let Some(params) = polling_job.job_params.as_object_mut() {
            params.insert("mapping_jobs".to_string(), Value::Object(mapping_jobs));
        } else {
            polling_job.job_params = json!({"mapping_jobs": mapping_jobs});
        }
        ctx.db.upsert_job_run(&polling_job);
        ctx.db.flush().map_err(JobError::Store)?;
    }

    job_manager.update_progress(100, 100, Some("Completed UniProt mapping job submission"))?;
    tracing::info!(score_set = %score_set.urn, "completed UniProt mapping job submission");
    Ok(JobResult::empty())
}

/// Poll submitted UniProt mapping jobs and write resolved ids to the
/// target genes.
///
/// Ids whose results are not ready yet are logged and skipped; a later
/// run of the poll job catches up. Missing or ambiguous results are
/// distinct fatal errors.
pub async fn poll_uniprot_mapping_jobs_for_score_set(
    ctx: JobContext,
    _job_id: JobId,
    job_manager: JobManager,
) -> Result<JobResult, JobError> {
    let job = job_manager.job()?;
    validate_job_params(&job, &["score_set_id", "mapping_jobs"])?;
    let score_set_id = ScoreSetId::new(param_str(&job, "score_set_id")?);
    let score_set = ctx.db.score_set(&score_set_id)?;

    job_manager.update_progress(0, 100, Some("Starting UniProt mapping job polling"))?;
    tracing::info!(score_set = %score_set.urn, "started UniProt mapping job polling");

    let mapping_jobs = job
        .job_params
        .get("mapping_jobs")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if mapping_jobs.is_empty() {
        job_manager.update_progress(100, 100, Some("No mapping jobs found to poll"))?;
        tracing::warn!(score_set = %score_set.urn, "no mapping jobs found in job params");
        return Ok(JobResult::empty());
    }

    let genes = ctx.db.target_genes_for(&score_set.id);
    let total = mapping_jobs.len();
    for (index, (target_gene_id, mapping_job)) in mapping_jobs.iter().enumerate() {
        let Some(remote_job_id) = mapping_job.get("job_id").and_then(Value::as_str) else {
            tracing::warn!(target_gene = %target_gene_id, "no UniProt job id recorded; skipped polling");
            continue;
        };
        let accession = mapping_job
            .get("accession")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let uniprot = ctx.clients.uniprot.clone();
        let poll_id = remote_job_id.to_string();
        let ready = ctx.pool.run(move || uniprot.results_ready(&poll_id)).await??;
        if !ready {
            // Future runs of the poll job catch this id up
            tracing::warn!(uniprot_job = %remote_job_id, "results not ready; skipped polling this job");
            continue;
        }

        let uniprot = ctx.clients.uniprot.clone();
        let results_id = remote_job_id.to_string();
        let results = ctx
            .pool
            .run(move || uniprot.mapping_results(&results_id))
            .await??;

        let matches: Vec<String> = extract_uniprot_ids(&results)
            .into_iter()
            .filter(|(from, _)| *from == accession)
            .map(|(_, uniprot_id)| uniprot_id)
            .collect();
        if matches.is_empty() {
            let message = format!("no UniProt ID found for accession {accession}");
            job_manager.update_progress(100, 100, Some(&message))?;
            tracing::error!(score_set = %score_set.urn, accession, "no UniProt ID found");
            return Err(JobError::UniprotMappingResultNotFound(message));
        }
        if matches.len() != 1 {
            let message = format!("ambiguous UniProt ID mapping results for accession {accession}");
            job_manager.update_progress(100, 100, Some(&message))?;
            tracing::error!(score_set = %score_set.urn, accession, "ambiguous UniProt mapping results");
            return Err(JobError::UniprotAmbiguousMappingResult(message));
        }

        let Some(gene) = genes.iter().find(|g| g.id.as_str() == target_gene_id.as_str()) else {
            let message = format!(
                "target gene {target_gene_id} not found in score set {}",
                score_set.urn
            );
            job_manager.update_progress(100, 100, Some(&message))?;
            return Err(JobError::NonexistentTargetGene(message));
        };

        let mut gene = gene.clone();
        gene.uniprot_id = Some(matches[0].clone());
        ctx.db.upsert_target_gene(&gene);
        ctx.db.flush().map_err(JobError::Store)?;
        tracing::info!(target_gene = %gene.id, uniprot_id = %matches[0], "updated target gene with UniProt ID");

        job_manager.update_progress(
            (((index + 1) * 95) / total) as u32,
            100,
            Some(&format!("Polled UniProt mapping job for {}", gene.name)),
        )?;
    }

    job_manager.update_progress(100, 100, Some("Completed polling of UniProt mapping jobs"))?;
    Ok(JobResult::empty())
}

#[cfg(test)]
#[path = "uniprot_tests.rs"]
mod tests;
