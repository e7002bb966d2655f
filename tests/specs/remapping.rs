// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: re-mapping a variant rewrites its current mapped record.

use crate::prelude::SpecWorld;
use mj_adapters::{MappedScore, MappingResponse, ReferenceMetadata};
use mj_core::{AnnotationLayer, JobStatus};
use serde_json::json;
use std::collections::HashMap;

#[tokio::test]
async fn remapping_flips_current_and_preserves_uniqueness() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_target_gene("tg-1", "ss-1", "BRCA1");
    world.seed_variant("v1", "ss-1");
    let m1 = world.seed_mapped_variant("m1", "v1", "g.43045712A>T");

    // Time moves on before the re-mapping runs
    world.clock.advance_secs(86_400);

    let mut reference_sequences = HashMap::new();
    reference_sequences.insert(
        "tg-1".to_string(),
        ReferenceMetadata {
            pre_mapped: HashMap::new(),
            post_mapped: HashMap::from([(
                AnnotationLayer::Genomic,
                json!({"sequence_accession": "NC_000017.11"}),
            )]),
        },
    );
    world.mapper.respond_with(MappingResponse {
        mapped_scores: vec![MappedScore {
            variant_urn: "urn:mavejobs:variant:v1".to_string(),
            pre_mapped: Some(json!({})),
            post_mapped: Some(json!({"expressions": [{"value": "NC_000017.11:g.43045712A>T"}]})),
            error_message: None,
        }],
        reference_sequences,
        vrs_version: Some("2.0".to_string()),
        error_message: None,
    });

    let job = world.seed_job(
        "map",
        "map_variants_for_score_set",
        None,
        json!({"score_set_id": "ss-1"}),
    );
    world.enqueue(&job).await;
    world.worker().run_until_idle().await;

    assert_eq!(world.job("map").status, JobStatus::Succeeded);

    let all = world.ctx.db.mapped_variants_for_variant(&"v1".into());
    assert_eq!(all.len(), 2);

    let old = all.iter().find(|m| m.id == m1.id).unwrap();
    assert!(!old.current);

    let current = all.iter().find(|m| m.current).unwrap();
    assert_ne!(current.id, m1.id);
    assert!(current.mapped_date > m1.mapped_date);

    world.assert_invariants();
}
