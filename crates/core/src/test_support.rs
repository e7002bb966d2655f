// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record builders for other crates' tests.

use crate::clock::{Clock, FakeClock};
use crate::domain::{MappedVariant, ScoreSet, TargetGene, Variant};
use crate::id::{JobId, MappedVariantId, PipelineId, ScoreSetId, TargetGeneId, VariantId};
use crate::job_run::{JobRun, JobRunConfig};
use crate::pipeline::Pipeline;
use serde_json::{json, Value};

/// A PENDING job run with sensible defaults for tests.
pub fn job_run(id: &str, function: &str, pipeline: Option<&str>, params: Value) -> JobRun {
    let clock = FakeClock::new();
    let mut config = JobRunConfig::new(id, format!("urn:mavejobs:job:{id}"), function)
        .params(params)
        .max_retries(3);
    if let Some(pipeline) = pipeline {
        config = config.pipeline(pipeline);
    }
    JobRun::new(config, clock.now())
}

/// A CREATED pipeline.
pub fn pipeline(id: &str) -> Pipeline {
    let clock = FakeClock::new();
    Pipeline::new(PipelineId::new(id), clock.now())
}

pub fn score_set(id: &str) -> ScoreSet {
    ScoreSet::new(ScoreSetId::new(id), format!("urn:mavejobs:score-set:{id}"))
}

pub fn target_gene(id: &str, score_set_id: &str, name: &str) -> TargetGene {
    TargetGene::new(
        TargetGeneId::new(id),
        ScoreSetId::new(score_set_id),
        name,
    )
}

pub fn variant(id: &str, score_set_id: &str) -> Variant {
    Variant {
        id: VariantId::new(id),
        urn: format!("urn:mavejobs:variant:{id}"),
        score_set_id: ScoreSetId::new(score_set_id),
        data: json!({}),
    }
}

/// A current mapped variant carrying a post-mapped expression.
pub fn mapped_variant(id: &str, variant_id: &str, hgvs: &str) -> MappedVariant {
    let clock = FakeClock::new();
    MappedVariant {
        id: MappedVariantId::new(id),
        variant_id: VariantId::new(variant_id),
        pre_mapped: Some(json!({})),
        post_mapped: Some(json!({"expressions": [{"value": hgvs}]})),
        current: true,
        mapped_date: clock.now(),
        vrs_version: Some("2.0".to_string()),
        clingen_allele_id: None,
        error_message: None,
    }
}

/// Convenience id wrapper for terser test call sites.
pub fn job_id(id: &str) -> JobId {
    JobId::new(id)
}
