// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn annotation_layer_serializes_as_lowercase_name() {
    assert_eq!(
        serde_json::to_string(&AnnotationLayer::Cdna).unwrap(),
        r#""cdna""#
    );
    assert_eq!(AnnotationLayer::Protein.to_string(), "protein");
}

#[test]
fn target_gene_metadata_keys_by_layer() {
    let mut gene = TargetGene::new("tg-1", "ss-1", "BRCA1");
    gene.post_mapped_metadata
        .insert(AnnotationLayer::Protein, json!({"sequence_accession": "NP_000050.3"}));

    let json = serde_json::to_value(&gene).unwrap();
    assert_eq!(
        json["post_mapped_metadata"]["protein"]["sequence_accession"],
        "NP_000050.3"
    );

    let parsed: TargetGene = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, gene);
}

#[test]
fn score_set_states_serialize_snake_case() {
    let mut score_set = ScoreSet::new("ss-1", "urn:mj:ss-1");
    score_set.processing_state = Some(ProcessingState::Success);
    score_set.mapping_state = Some(MappingState::NotAttempted);

    let value = serde_json::to_value(&score_set).unwrap();
    assert_eq!(value["processing_state"], "success");
    assert_eq!(value["mapping_state"], "not_attempted");
}

#[test]
fn mapped_variant_round_trip() {
    let mapped = MappedVariant {
        id: MappedVariantId::new("mv-1"),
        variant_id: VariantId::new("v-1"),
        pre_mapped: None,
        post_mapped: Some(json!({"expressions": [{"value": "NC_000017.11:g.43045712A>T"}]})),
        current: true,
        mapped_date: chrono::DateTime::UNIX_EPOCH,
        vrs_version: Some("2.0".to_string()),
        clingen_allele_id: Some("CA123".to_string()),
        error_message: None,
    };
    let json = serde_json::to_string(&mapped).unwrap();
    let parsed: MappedVariant = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, mapped);
}

#[test]
fn annotation_record_types_serialize() {
    assert_eq!(
        serde_json::to_string(&AnnotationType::ClinvarControl).unwrap(),
        r#""clinvar_control""#
    );
    assert_eq!(
        serde_json::to_string(&AnnotationStatus::Skipped).unwrap(),
        r#""skipped""#
    );
}
