// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit-of-work handle managers mutate state through.
//!
//! Writes are staged until `flush` publishes them to sibling reads within
//! the same transaction. `commit` makes flushed writes durable (journal
//! append + baseline swap); `rollback` discards everything uncommitted.
//! The session never commits on its own; commit discipline belongs to the
//! dispatch decorator.

use crate::journal::{Journal, JournalError, JournalRecord};
use crate::state::WorkerState;
use mj_core::{
    AnnotationRecord, AnnotationType, ClinicalControl, ControlId, JobDependency, JobId, JobRun,
    JobStatus, MappedVariant, MappedVariantId, Pipeline, PipelineId, ScoreSet, ScoreSetId,
    TargetGene, Variant, VariantId,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from gateway operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("urn conflict: {urn} already belongs to job {existing}")]
    UrnConflict { urn: String, existing: String },
    #[error("broken dependency edge for job {job_id}: predecessor {depends_on} missing")]
    BrokenDependency { job_id: String, depends_on: String },
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

/// A single staged row mutation.
///
/// Serializable so committed writes can be journaled and replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateWrite {
    UpsertJobRun(JobRun),
    UpsertPipeline(Pipeline),
    InsertDependency(JobDependency),
    UpsertScoreSet(ScoreSet),
    UpsertTargetGene(TargetGene),
    UpsertVariant(Variant),
    /// Replace-all semantics for variant creation: drops the score set's
    /// variants together with their mapped variants, annotations, and
    /// control links.
    DeleteVariantsForScoreSet(ScoreSetId),
    UpsertMappedVariant(MappedVariant),
    UpsertClinicalControl(ClinicalControl),
    LinkClinicalControl {
        mapped_variant_id: MappedVariantId,
        control_id: ControlId,
    },
    UpsertAnnotation(AnnotationRecord),
}

impl StateWrite {
    fn apply(&self, state: &mut WorkerState) -> Result<(), StoreError> {
        match self {
            StateWrite::UpsertJobRun(job) => {
                if let Some(existing) = state.job_run_by_urn(&job.urn) {
                    if existing.id != job.id {
                        return Err(StoreError::UrnConflict {
                            urn: job.urn.clone(),
                            existing: existing.id.to_string(),
                        });
                    }
                }
                state.job_runs.insert(job.id.to_string(), job.clone());
            }
            StateWrite::UpsertPipeline(pipeline) => {
                state
                    .pipelines
                    .insert(pipeline.id.to_string(), pipeline.clone());
            }
            StateWrite::InsertDependency(dep) => {
                if !state.job_dependencies.contains(dep) {
                    state.job_dependencies.push(dep.clone());
                }
            }
            StateWrite::UpsertScoreSet(score_set) => {
                state
                    .score_sets
                    .insert(score_set.id.to_string(), score_set.clone());
            }
            StateWrite::UpsertTargetGene(gene) => {
                state.target_genes.insert(gene.id.to_string(), gene.clone());
            }
            StateWrite::UpsertVariant(variant) => {
                state.variants.insert(variant.id.to_string(), variant.clone());
            }
            StateWrite::DeleteVariantsForScoreSet(score_set_id) => {
                let removed: Vec<String> = state
                    .variants
                    .values()
                    .filter(|v| v.score_set_id == *score_set_id)
                    .map(|v| v.id.to_string())
                    .collect();
                for variant_id in &removed {
                    state.variants.remove(variant_id);
                    let mapped: Vec<String> = state
                        .mapped_variants
                        .values()
                        .filter(|m| m.variant_id.as_str() == variant_id)
                        .map(|m| m.id.to_string())
                        .collect();
                    for mapped_id in mapped {
                        state.mapped_variants.remove(&mapped_id);
                        state.control_links.retain(|(mv, _)| mv != &mapped_id);
                    }
                    state
                        .annotations
                        .retain(|_, a| a.variant_id.as_str() != variant_id);
                }
            }
            StateWrite::UpsertMappedVariant(mapped) => {
                state
                    .mapped_variants
                    .insert(mapped.id.to_string(), mapped.clone());
            }
            StateWrite::UpsertClinicalControl(control) => {
                state
                    .clinical_controls
                    .insert(control.id.to_string(), control.clone());
            }
            StateWrite::LinkClinicalControl {
                mapped_variant_id,
                control_id,
            } => {
                state
                    .control_links
                    .insert((mapped_variant_id.to_string(), control_id.to_string()));
            }
            StateWrite::UpsertAnnotation(annotation) => {
                state
                    .annotations
                    .insert(annotation.id.to_string(), annotation.clone());
            }
        }
        Ok(())
    }
}

struct Inner {
    /// Durable baseline as of the last commit
    committed: WorkerState,
    /// Baseline plus flushed writes; what reads observe
    visible: WorkerState,
    /// Writes staged since the last flush (invisible to reads)
    staged: Vec<StateWrite>,
    /// Flushed but uncommitted writes, pending journal append
    flushed: Vec<StateWrite>,
    journal: Option<Journal>,
    flush_count: u64,
    commit_count: u64,
}

/// Cheap-clone handle to the shared unit of work
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    /// In-memory session with no durability (tests, dry runs)
    pub fn in_memory() -> Self {
        Self::from_state(WorkerState::default())
    }

    pub fn from_state(state: WorkerState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                committed: state.clone(),
                visible: state,
                staged: Vec::new(),
                flushed: Vec::new(),
                journal: None,
                flush_count: 0,
                commit_count: 0,
            })),
        }
    }

    /// Open a journal-backed session, replaying committed writes from disk.
    pub fn open(journal_path: &Path) -> Result<Self, StoreError> {
        let journal = Journal::open(journal_path)?;
        let mut state = WorkerState::default();
        for record in journal.entries()? {
            for write in &record.writes {
                write.apply(&mut state)?;
            }
        }
        let session = Self::from_state(state);
        session.inner.lock().journal = Some(journal);
        Ok(session)
    }

    /// Publish staged writes to sibling reads.
    ///
    /// Writes are validated against the visible state; on error nothing is
    /// published and the staged set is left intact for rollback.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.staged.is_empty() {
            let mut next = inner.visible.clone();
            for write in &inner.staged {
                write.apply(&mut next)?;
            }
            inner.visible = next;
            let mut staged = std::mem::take(&mut inner.staged);
            inner.flushed.append(&mut staged);
        }
        inner.flush_count += 1;
        Ok(())
    }

    /// Make all flushed writes durable and swap the committed baseline.
    pub fn commit(&self) -> Result<(), StoreError> {
        self.flush()?;
        let mut inner = self.inner.lock();
        inner.committed = inner.visible.clone();
        let writes = std::mem::take(&mut inner.flushed);
        inner.commit_count += 1;
        let seq = inner.commit_count;
        if let Some(journal) = inner.journal.as_mut() {
            journal.append(&JournalRecord { seq, writes })?;
            journal.flush()?;
        }
        Ok(())
    }

    /// Discard all staged and flushed-but-uncommitted writes.
    pub fn rollback(&self) {
        let mut inner = self.inner.lock();
        inner.staged.clear();
        inner.flushed.clear();
        inner.visible = inner.committed.clone();
    }

    pub fn flush_count(&self) -> u64 {
        self.inner.lock().flush_count
    }

    pub fn commit_count(&self) -> u64 {
        self.inner.lock().commit_count
    }

    fn stage(&self, write: StateWrite) {
        self.inner.lock().staged.push(write);
    }

    // ----- reads (observe the visible state) -----

    pub fn job_run(&self, id: &JobId) -> Result<JobRun, StoreError> {
        self.inner
            .lock()
            .visible
            .job_runs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "job run",
                id: id.to_string(),
            })
    }

    pub fn job_run_by_urn(&self, urn: &str) -> Result<JobRun, StoreError> {
        self.inner
            .lock()
            .visible
            .job_run_by_urn(urn)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "job run",
                id: urn.to_string(),
            })
    }

    pub fn pipeline(&self, id: &PipelineId) -> Result<Pipeline, StoreError> {
        self.inner
            .lock()
            .visible
            .pipelines
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "pipeline",
                id: id.to_string(),
            })
    }

    /// Jobs in a pipeline, optionally filtered to a status set, ordered by
    /// creation time.
    pub fn jobs_in_pipeline(
        &self,
        pipeline_id: &PipelineId,
        statuses: Option<&[JobStatus]>,
    ) -> Vec<JobRun> {
        self.inner
            .lock()
            .visible
            .jobs_in_pipeline(pipeline_id.as_str())
            .into_iter()
            .filter(|j| statuses.map_or(true, |s| s.contains(&j.status)))
            .cloned()
            .collect()
    }

    /// Dependency edges for a job joined with each predecessor row.
    pub fn dependencies_with_predecessors(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<(JobDependency, JobRun)>, StoreError> {
        let inner = self.inner.lock();
        let mut joined = Vec::new();
        for dep in inner
            .visible
            .job_dependencies
            .iter()
            .filter(|d| d.job_id == *job_id)
        {
            let predecessor = inner
                .visible
                .job_runs
                .get(dep.depends_on_job_id.as_str())
                .ok_or_else(|| StoreError::BrokenDependency {
                    job_id: job_id.to_string(),
                    depends_on: dep.depends_on_job_id.to_string(),
                })?;
            joined.push((dep.clone(), predecessor.clone()));
        }
        Ok(joined)
    }

    /// Edges pointing at a predecessor, joined with the dependent rows.
    pub fn dependents_of(&self, job_id: &JobId) -> Vec<(JobDependency, JobRun)> {
        self.inner
            .lock()
            .visible
            .dependents_of(job_id.as_str())
            .into_iter()
            .map(|(d, j)| (d.clone(), j.clone()))
            .collect()
    }

    pub fn job_counts_by_status(&self, pipeline_id: &PipelineId) -> HashMap<JobStatus, usize> {
        self.inner
            .lock()
            .visible
            .job_counts_by_status(pipeline_id.as_str())
    }

    pub fn score_set(&self, id: &ScoreSetId) -> Result<ScoreSet, StoreError> {
        self.inner
            .lock()
            .visible
            .score_sets
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "score set",
                id: id.to_string(),
            })
    }

    pub fn target_genes_for(&self, score_set_id: &ScoreSetId) -> Vec<TargetGene> {
        self.inner
            .lock()
            .visible
            .target_genes_for(score_set_id.as_str())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn variants_for(&self, score_set_id: &ScoreSetId) -> Vec<Variant> {
        self.inner
            .lock()
            .visible
            .variants_for(score_set_id.as_str())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn variant(&self, id: &VariantId) -> Result<Variant, StoreError> {
        self.inner
            .lock()
            .visible
            .variants
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "variant",
                id: id.to_string(),
            })
    }

    pub fn variant_by_urn(&self, urn: &str) -> Result<Variant, StoreError> {
        self.inner
            .lock()
            .visible
            .variant_by_urn(urn)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "variant",
                id: urn.to_string(),
            })
    }

    pub fn mapped_variants_for_variant(&self, variant_id: &VariantId) -> Vec<MappedVariant> {
        self.inner
            .lock()
            .visible
            .mapped_variants_for_variant(variant_id.as_str())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn current_mapped_variant(&self, variant_id: &VariantId) -> Option<MappedVariant> {
        self.inner
            .lock()
            .visible
            .current_mapped_variant(variant_id.as_str())
            .cloned()
    }

    pub fn current_mapped_variants_for_score_set(
        &self,
        score_set_id: &ScoreSetId,
    ) -> Vec<(Variant, MappedVariant)> {
        self.inner
            .lock()
            .visible
            .current_mapped_variants_for_score_set(score_set_id.as_str())
            .into_iter()
            .map(|(v, m)| (v.clone(), m.clone()))
            .collect()
    }

    pub fn clinical_control_by(
        &self,
        db_name: &str,
        db_identifier: &str,
        db_version: &str,
    ) -> Option<ClinicalControl> {
        self.inner
            .lock()
            .visible
            .clinical_control_by(db_name, db_identifier, db_version)
            .cloned()
    }

    pub fn controls_linked_to(&self, mapped_variant_id: &MappedVariantId) -> Vec<ClinicalControl> {
        self.inner
            .lock()
            .visible
            .controls_linked_to(mapped_variant_id.as_str())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn annotations_for(
        &self,
        variant_id: &VariantId,
        annotation_type: AnnotationType,
    ) -> Vec<AnnotationRecord> {
        self.inner
            .lock()
            .visible
            .annotations_for(variant_id.as_str(), annotation_type)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn current_annotation(
        &self,
        variant_id: &VariantId,
        annotation_type: AnnotationType,
    ) -> Option<AnnotationRecord> {
        self.inner
            .lock()
            .visible
            .current_annotation(variant_id.as_str(), annotation_type)
            .cloned()
    }

    /// Snapshot of the visible state (monitoring, tests)
    pub fn snapshot(&self) -> WorkerState {
        self.inner.lock().visible.clone()
    }

    // ----- writes (staged until flush) -----

    pub fn upsert_job_run(&self, job: &JobRun) {
        self.stage(StateWrite::UpsertJobRun(job.clone()));
    }

    pub fn upsert_pipeline(&self, pipeline: &Pipeline) {
        self.stage(StateWrite::UpsertPipeline(pipeline.clone()));
    }

    pub fn insert_dependency(&self, dep: &JobDependency) {
        self.stage(StateWrite::InsertDependency(dep.clone()));
    }

    pub fn upsert_score_set(&self, score_set: &ScoreSet) {
        self.stage(StateWrite::UpsertScoreSet(score_set.clone()));
    }

    pub fn upsert_target_gene(&self, gene: &TargetGene) {
        self.stage(StateWrite::UpsertTargetGene(gene.clone()));
    }

    pub fn upsert_variant(&self, variant: &Variant) {
        self.stage(StateWrite::UpsertVariant(variant.clone()));
    }

    pub fn delete_variants_for_score_set(&self, score_set_id: &ScoreSetId) {
        self.stage(StateWrite::DeleteVariantsForScoreSet(score_set_id.clone()));
    }

    pub fn upsert_mapped_variant(&self, mapped: &MappedVariant) {
        self.stage(StateWrite::UpsertMappedVariant(mapped.clone()));
    }

    pub fn upsert_clinical_control(&self, control: &ClinicalControl) {
        self.stage(StateWrite::UpsertClinicalControl(control.clone()));
    }

    pub fn link_clinical_control(
        &self,
        mapped_variant_id: &MappedVariantId,
        control_id: &ControlId,
    ) {
        self.stage(StateWrite::LinkClinicalControl {
            mapped_variant_id: mapped_variant_id.clone(),
            control_id: control_id.clone(),
        });
    }

    pub fn upsert_annotation(&self, annotation: &AnnotationRecord) {
        self.stage(StateWrite::UpsertAnnotation(annotation.clone()));
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
