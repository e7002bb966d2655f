// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized row tables for the worker's authoritative state.

use mj_core::{
    AnnotationRecord, AnnotationType, ClinicalControl, JobDependency, JobRun, JobStatus,
    MappedVariant, Pipeline, ScoreSet, TargetGene, Variant,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Row tables for every record the worker persists.
///
/// Keys are the record ids. The shape is fixed; the physical representation
/// (here: in-memory maps checkpointed through the commit journal) is an
/// implementation detail of the gateway.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WorkerState {
    #[serde(default)]
    pub job_runs: HashMap<String, JobRun>,
    #[serde(default)]
    pub pipelines: HashMap<String, Pipeline>,
    #[serde(default)]
    pub job_dependencies: Vec<JobDependency>,
    #[serde(default)]
    pub score_sets: HashMap<String, ScoreSet>,
    #[serde(default)]
    pub target_genes: HashMap<String, TargetGene>,
    #[serde(default)]
    pub variants: HashMap<String, Variant>,
    #[serde(default)]
    pub mapped_variants: HashMap<String, MappedVariant>,
    #[serde(default)]
    pub clinical_controls: HashMap<String, ClinicalControl>,
    /// Links between mapped variants and clinical controls:
    /// (mapped_variant_id, control_id)
    #[serde(default)]
    pub control_links: BTreeSet<(String, String)>,
    #[serde(default)]
    pub annotations: HashMap<String, AnnotationRecord>,
}

impl WorkerState {
    /// Jobs belonging to a pipeline, ordered by creation time (id as a
    /// tiebreak so listings are deterministic).
    pub fn jobs_in_pipeline(&self, pipeline_id: &str) -> Vec<&JobRun> {
        let mut jobs: Vec<&JobRun> = self
            .job_runs
            .values()
            .filter(|j| {
                j.pipeline_id
                    .as_ref()
                    .is_some_and(|p| p.as_str() == pipeline_id)
            })
            .collect();
        jobs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        jobs
    }

    pub fn job_run_by_urn(&self, urn: &str) -> Option<&JobRun> {
        self.job_runs.values().find(|j| j.urn == urn)
    }

    /// Dependency edges for a job, each joined with its predecessor row.
    /// Edges whose predecessor row is missing are reported as broken by the
    /// session layer; here they are simply skipped.
    pub fn dependencies_with_predecessors(&self, job_id: &str) -> Vec<(&JobDependency, &JobRun)> {
        self.job_dependencies
            .iter()
            .filter(|d| d.job_id.as_str() == job_id)
            .filter_map(|d| {
                self.job_runs
                    .get(d.depends_on_job_id.as_str())
                    .map(|j| (d, j))
            })
            .collect()
    }

    /// Edges pointing at a predecessor, each joined with the dependent row.
    pub fn dependents_of(&self, job_id: &str) -> Vec<(&JobDependency, &JobRun)> {
        self.job_dependencies
            .iter()
            .filter(|d| d.depends_on_job_id.as_str() == job_id)
            .filter_map(|d| self.job_runs.get(d.job_id.as_str()).map(|j| (d, j)))
            .collect()
    }

    pub fn job_counts_by_status(&self, pipeline_id: &str) -> HashMap<JobStatus, usize> {
        let mut counts = HashMap::new();
        for job in self.job_runs.values() {
            if job
                .pipeline_id
                .as_ref()
                .is_some_and(|p| p.as_str() == pipeline_id)
            {
                *counts.entry(job.status).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn target_genes_for(&self, score_set_id: &str) -> Vec<&TargetGene> {
        let mut genes: Vec<&TargetGene> = self
            .target_genes
            .values()
            .filter(|g| g.score_set_id.as_str() == score_set_id)
            .collect();
        genes.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        genes
    }

    pub fn variant_by_urn(&self, urn: &str) -> Option<&Variant> {
        self.variants.values().find(|v| v.urn == urn)
    }

    pub fn variants_for(&self, score_set_id: &str) -> Vec<&Variant> {
        let mut variants: Vec<&Variant> = self
            .variants
            .values()
            .filter(|v| v.score_set_id.as_str() == score_set_id)
            .collect();
        variants.sort_by(|a, b| a.urn.cmp(&b.urn));
        variants
    }

    pub fn mapped_variants_for_variant(&self, variant_id: &str) -> Vec<&MappedVariant> {
        let mut mapped: Vec<&MappedVariant> = self
            .mapped_variants
            .values()
            .filter(|m| m.variant_id.as_str() == variant_id)
            .collect();
        mapped.sort_by(|a, b| a.mapped_date.cmp(&b.mapped_date));
        mapped
    }

    pub fn current_mapped_variant(&self, variant_id: &str) -> Option<&MappedVariant> {
        self.mapped_variants
            .values()
            .find(|m| m.variant_id.as_str() == variant_id && m.current)
    }

    /// Current mapped variants joined with their variants, for every
    /// variant in a score set, ordered by variant urn.
    pub fn current_mapped_variants_for_score_set(
        &self,
        score_set_id: &str,
    ) -> Vec<(&Variant, &MappedVariant)> {
        self.variants_for(score_set_id)
            .into_iter()
            .filter_map(|v| self.current_mapped_variant(v.id.as_str()).map(|m| (v, m)))
            .collect()
    }

    pub fn clinical_control_by(
        &self,
        db_name: &str,
        db_identifier: &str,
        db_version: &str,
    ) -> Option<&ClinicalControl> {
        self.clinical_controls.values().find(|c| {
            c.db_name == db_name && c.db_identifier == db_identifier && c.db_version == db_version
        })
    }

    pub fn controls_linked_to(&self, mapped_variant_id: &str) -> Vec<&ClinicalControl> {
        self.control_links
            .iter()
            .filter(|(mv, _)| mv == mapped_variant_id)
            .filter_map(|(_, control)| self.clinical_controls.get(control))
            .collect()
    }

    pub fn annotations_for(
        &self,
        variant_id: &str,
        annotation_type: AnnotationType,
    ) -> Vec<&AnnotationRecord> {
        let mut rows: Vec<&AnnotationRecord> = self
            .annotations
            .values()
            .filter(|a| {
                a.variant_id.as_str() == variant_id && a.annotation_type == annotation_type
            })
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows
    }

    pub fn current_annotation(
        &self,
        variant_id: &str,
        annotation_type: AnnotationType,
    ) -> Option<&AnnotationRecord> {
        self.annotations.values().find(|a| {
            a.variant_id.as_str() == variant_id
                && a.annotation_type == annotation_type
                && a.current
        })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
