// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::dispatch;
use crate::test_helpers::Harness;
use mj_adapters::{MappedScore, MappingResponse, ReferenceMetadata};
use mj_core::{AnnotationLayer, JobStatus};
use serde_json::json;
use std::collections::HashMap;

fn seed_mapping_job(harness: &Harness, variant_count: usize) {
    harness.seed_score_set("ss-1");
    harness.seed_target_gene("tg-1", "ss-1", "BRCA1");
    for i in 1..=variant_count {
        harness.seed_variant(&format!("v{i}"), "ss-1");
    }
    harness.seed_job(
        "j1",
        "map_variants_for_score_set",
        None,
        json!({"score_set_id": "ss-1"}),
    );
}

fn mapping_response(scores: Vec<MappedScore>) -> MappingResponse {
    let mut reference_sequences = HashMap::new();
    reference_sequences.insert(
        "tg-1".to_string(),
        ReferenceMetadata {
            pre_mapped: HashMap::from([(
                AnnotationLayer::Genomic,
                json!({"sequence_accession": "NC_000017.10"}),
            )]),
            post_mapped: HashMap::from([(
                AnnotationLayer::Genomic,
                json!({"sequence_accession": "NC_000017.11"}),
            )]),
        },
    );
    MappingResponse {
        mapped_scores: scores,
        reference_sequences,
        vrs_version: Some("2.0".to_string()),
        error_message: None,
    }
}

fn mapped_score(urn: &str, ok: bool) -> MappedScore {
    MappedScore {
        variant_urn: urn.to_string(),
        pre_mapped: Some(json!({})),
        post_mapped: ok.then(|| json!({"expressions": [{"value": "g.1A>T"}]})),
        error_message: (!ok).then(|| "could not translate".to_string()),
    }
}

#[tokio::test]
async fn full_success_sets_mapping_complete() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 2);
    harness.mapper.respond_with(mapping_response(vec![
        mapped_score("urn:mavejobs:variant:v1", true),
        mapped_score("urn:mavejobs:variant:v2", true),
    ]));

    let result = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap();
    assert_eq!(result.data()["mapped"], 2);
    assert_eq!(result.data()["failed"], 0);

    let score_set = harness.ctx.db.score_set(&"ss-1".into()).unwrap();
    assert_eq!(score_set.mapping_state, Some(MappingState::Complete));

    for v in ["v1", "v2"] {
        let current = harness.ctx.db.current_mapped_variant(&v.into()).unwrap();
        assert!(current.post_mapped.is_some());
        assert_eq!(current.vrs_version.as_deref(), Some("2.0"));
    }

    // Reference metadata landed on the target gene per layer
    let gene = &harness.ctx.db.target_genes_for(&"ss-1".into())[0];
    assert_eq!(
        gene.post_mapped_metadata[&AnnotationLayer::Genomic]["sequence_accession"],
        "NC_000017.11"
    );
    assert_eq!(
        gene.pre_mapped_metadata[&AnnotationLayer::Genomic]["sequence_accession"],
        "NC_000017.10"
    );
}

#[tokio::test]
async fn remapping_flips_prior_current_row() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 1);
    let old = harness.seed_mapped_variant("m-old", "v1", "g.0C>G");
    harness.clock.advance_secs(3600);
    harness.mapper.respond_with(mapping_response(vec![mapped_score(
        "urn:mavejobs:variant:v1",
        true,
    )]));

    dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap();

    let all = harness.ctx.db.mapped_variants_for_variant(&"v1".into());
    assert_eq!(all.len(), 2);
    let currents: Vec<_> = all.iter().filter(|m| m.current).collect();
    assert_eq!(currents.len(), 1);
    assert_ne!(currents[0].id, old.id);
    assert!(currents[0].mapped_date > old.mapped_date);

    let old_row = all.iter().find(|m| m.id == old.id).unwrap();
    assert!(!old_row.current);
}

#[tokio::test]
async fn partial_success_is_incomplete() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 2);
    harness.mapper.respond_with(mapping_response(vec![
        mapped_score("urn:mavejobs:variant:v1", true),
        mapped_score("urn:mavejobs:variant:v2", false),
    ]));

    let result = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap();
    assert!(result.is_ok());
    assert_eq!(result.data()["failed"], 1);

    let score_set = harness.ctx.db.score_set(&"ss-1".into()).unwrap();
    assert_eq!(score_set.mapping_state, Some(MappingState::Incomplete));
    assert_eq!(harness.job("j1").status, JobStatus::Succeeded);
}

#[tokio::test]
async fn complete_mapping_failure_is_still_an_ok_result() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 2);
    harness.mapper.respond_with(mapping_response(vec![
        mapped_score("urn:mavejobs:variant:v1", false),
        mapped_score("urn:mavejobs:variant:v2", false),
    ]));

    let result = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap();
    assert!(result.is_ok());

    let score_set = harness.ctx.db.score_set(&"ss-1".into()).unwrap();
    assert_eq!(score_set.mapping_state, Some(MappingState::Failed));
    assert_eq!(harness.job("j1").status, JobStatus::Succeeded);
}

#[tokio::test]
async fn empty_document_is_nonexistent_results() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 1);
    harness.mapper.respond_with(MappingResponse::default());

    let err = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JobError::NonexistentMappingResults(_)));

    let score_set = harness.ctx.db.score_set(&"ss-1".into()).unwrap();
    assert_eq!(score_set.mapping_state, Some(MappingState::Failed));
    assert_eq!(harness.job("j1").status, JobStatus::Failed);
}

#[tokio::test]
async fn missing_scores_and_missing_reference_are_distinct_failures() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 1);

    // Reference metadata but no scores
    let response = mapping_response(vec![]);
    harness.mapper.respond_with(response);
    let err = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JobError::NonexistentMappingScores(_)));

    // Scores but no reference metadata
    harness.seed_job(
        "j2",
        "map_variants_for_score_set",
        None,
        json!({"score_set_id": "ss-1"}),
    );
    harness.mapper.respond_with(MappingResponse {
        mapped_scores: vec![mapped_score("urn:mavejobs:variant:v1", true)],
        ..MappingResponse::default()
    });
    let err = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j2".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JobError::NonexistentMappingReference(_)));
}

#[tokio::test]
async fn mapper_error_marks_mapping_failed() {
    let harness = Harness::new();
    seed_mapping_job(&harness, 1);
    harness.mapper.fail_with("connection reset");

    let err = dispatch(
        &harness.ctx,
        &harness.registry,
        "map_variants_for_score_set",
        &"j1".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JobError::Client(_)));

    let score_set = harness.ctx.db.score_set(&"ss-1".into()).unwrap();
    assert_eq!(score_set.mapping_state, Some(MappingState::Failed));
}
