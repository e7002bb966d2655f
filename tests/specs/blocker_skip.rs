// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: a failed predecessor makes the dependent unreachable.

use crate::prelude::SpecWorld;
use mj_core::{DependencyType, JobStatus, PipelineStatus};
use serde_json::json;

#[tokio::test]
async fn failed_blocker_skips_dependent_and_fails_pipeline() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_pipeline("p1");
    // Missing score_set_id makes J1 fail its param validation
    world.seed_job("j1", "link_gnomad_variants", Some("p1"), json!({}));
    world.seed_job(
        "j2",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_dependency("j2", "j1", DependencyType::SuccessRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    // J1 fails; coordination must skip J2 and fail the pipeline
    world.worker().run_until_idle().await;

    let j1 = world.job("j1");
    let j2 = world.job("j2");
    assert_eq!(j1.status, JobStatus::Failed);
    assert_eq!(j2.status, JobStatus::Skipped);

    // The skip reason names the blocking predecessor
    let reason = j2.result().unwrap();
    assert!(reason.data()["result"]
        .as_str()
        .unwrap()
        .contains(&j1.urn));

    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Failed);
    assert!(manager.active_jobs().unwrap().is_empty());
    world.assert_invariants();
}

#[tokio::test]
async fn transitive_skip_propagates_down_the_chain() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_pipeline("p1");
    world.seed_job("j1", "link_gnomad_variants", Some("p1"), json!({}));
    world.seed_job(
        "j2",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_job(
        "j3",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_dependency("j2", "j1", DependencyType::SuccessRequired);
    world.seed_dependency("j3", "j2", DependencyType::SuccessRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    world.worker().run_until_idle().await;

    assert_eq!(world.job("j1").status, JobStatus::Failed);
    assert_eq!(world.job("j2").status, JobStatus::Skipped);
    assert_eq!(world.job("j3").status, JobStatus::Skipped);
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Failed);
    world.assert_invariants();
}
