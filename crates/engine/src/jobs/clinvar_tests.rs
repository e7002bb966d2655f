// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::dispatch;
use crate::test_helpers::Harness;
use mj_core::JobStatus;

const SUMMARY: &str = "#AlleleID\tGeneSymbol\tClinicalSignificance\tReviewStatus\n\
15041\tBRCA1\tPathogenic\tcriteria provided, multiple submitters\n";

fn seed_refresh_job(harness: &Harness, caids: &[Option<&str>]) {
    harness.seed_score_set("ss-1");
    for (i, caid) in caids.iter().enumerate() {
        let variant_id = format!("v{}", i + 1);
        harness.seed_variant(&variant_id, "ss-1");
        let mut mapped =
            harness.seed_mapped_variant(&format!("m{}", i + 1), &variant_id, "g.1A>T");
        if let Some(caid) = caid {
            mapped.clingen_allele_id = Some(caid.to_string());
            harness.ctx.db.upsert_mapped_variant(&mapped);
            harness.commit();
        }
    }
    harness.seed_job(
        "j1",
        "refresh_clinvar_controls",
        None,
        json!({
            "score_set_id": "ss-1",
            "correlation_id": "corr-1",
            "year": 2024,
            "month": 8,
        }),
    );
    harness.clinvar.set_summary(SUMMARY);
}

#[tokio::test]
async fn refresh_creates_versioned_control_and_links_it() {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[Some("CA100")]);
    harness.allele_registry.associate_clinvar("CA100", "15041");

    let result = dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();
    assert_eq!(result.data()["clinvar_version"], "08_2024");

    let control = harness
        .ctx
        .db
        .clinical_control_by("ClinVar", "15041", "08_2024")
        .unwrap();
    assert_eq!(control.gene_symbol.as_deref(), Some("BRCA1"));
    assert_eq!(control.clinical_significance.as_deref(), Some("Pathogenic"));

    let linked = harness.ctx.db.controls_linked_to(&"m1".into());
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, control.id);

    let annotation = harness
        .ctx
        .db
        .current_annotation(&"v1".into(), AnnotationType::ClinvarControl)
        .unwrap();
    assert_eq!(annotation.status, AnnotationStatus::Success);
    assert_eq!(annotation.version, "08_2024");
    assert_eq!(
        annotation.annotation_data["success_data"]["clinvar_allele_id"],
        "15041"
    );
    assert_eq!(harness.job("j1").status, JobStatus::Succeeded);
}

#[tokio::test]
async fn refresh_updates_existing_control_for_same_version() {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[Some("CA100")]);
    harness.allele_registry.associate_clinvar("CA100", "15041");
    harness.ctx.db.upsert_clinical_control(&mj_core::ClinicalControl {
        id: "ctrl-1".into(),
        db_name: "ClinVar".to_string(),
        db_identifier: "15041".to_string(),
        db_version: "08_2024".to_string(),
        gene_symbol: None,
        clinical_significance: Some("Uncertain significance".to_string()),
        clinical_review_status: None,
    });
    harness.commit();

    dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();

    let control = harness
        .ctx
        .db
        .clinical_control_by("ClinVar", "15041", "08_2024")
        .unwrap();
    assert_eq!(control.id, "ctrl-1");
    assert_eq!(control.clinical_significance.as_deref(), Some("Pathogenic"));
}

async fn assert_skip_category(caid: Option<&str>, expected_category: &str) {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[caid]);

    dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();

    let annotation = harness
        .ctx
        .db
        .current_annotation(&"v1".into(), AnnotationType::ClinvarControl)
        .unwrap();
    assert_eq!(annotation.status, AnnotationStatus::Skipped);
    assert_eq!(annotation.annotation_data["failure_category"], expected_category);
}

#[tokio::test]
async fn missing_caid_is_skipped_with_category() {
    assert_skip_category(None, "missing_clingen_allele_id").await;
}

#[tokio::test]
async fn multi_variant_caid_is_skipped_with_category() {
    assert_skip_category(Some("CA100,CA200"), "multi_variant_clingen_allele_id").await;
}

#[tokio::test]
async fn no_associated_clinvar_allele_id_is_skipped() {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[Some("CA100")]);
    // No ClinVar association scripted for CA100

    dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();

    let annotation = harness
        .ctx
        .db
        .current_annotation(&"v1".into(), AnnotationType::ClinvarControl)
        .unwrap();
    assert_eq!(annotation.status, AnnotationStatus::Skipped);
    assert_eq!(
        annotation.annotation_data["failure_category"],
        "no_associated_clinvar_allele_id"
    );
}

#[tokio::test]
async fn allele_id_missing_from_snapshot_is_skipped() {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[Some("CA100")]);
    harness.allele_registry.associate_clinvar("CA100", "99999");

    dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();

    let annotation = harness
        .ctx
        .db
        .current_annotation(&"v1".into(), AnnotationType::ClinvarControl)
        .unwrap();
    assert_eq!(annotation.status, AnnotationStatus::Skipped);
    assert_eq!(
        annotation.annotation_data["failure_category"],
        "no_clinvar_variant_data"
    );
}

#[tokio::test]
async fn clingen_api_error_is_recorded_and_the_job_continues() {
    let harness = Harness::new();
    seed_refresh_job(&harness, &[Some("CA100")]);
    harness.allele_registry.fail_with("registry down");

    dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap();

    let annotation = harness
        .ctx
        .db
        .current_annotation(&"v1".into(), AnnotationType::ClinvarControl)
        .unwrap();
    assert_eq!(annotation.status, AnnotationStatus::Failed);
    assert_eq!(
        annotation.annotation_data["failure_category"],
        "clingen_api_error"
    );
    assert_eq!(harness.job("j1").status, JobStatus::Succeeded);
}

#[tokio::test]
async fn invalid_snapshot_date_fails_validation() {
    let harness = Harness::new();
    harness.seed_score_set("ss-1");
    harness.seed_job(
        "j1",
        "refresh_clinvar_controls",
        None,
        json!({"score_set_id": "ss-1", "year": 2010, "month": 8}),
    );

    let err = dispatch(
        &harness.ctx,
        &harness.registry,
        "refresh_clinvar_controls",
        &"j1".into(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        JobError::Client(mj_adapters::ClientError::Validation(_))
    ));
}
