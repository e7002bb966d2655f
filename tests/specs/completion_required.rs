// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: COMPLETION_REQUIRED tolerates a failed predecessor.

use crate::prelude::SpecWorld;
use mj_core::{DependencyType, JobStatus, PipelineStatus};
use serde_json::json;

#[tokio::test]
async fn dependent_runs_after_predecessor_failure_and_pipeline_is_partial() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_pipeline("p1");
    // Missing params make J1 fail
    world.seed_job("j1", "link_gnomad_variants", Some("p1"), json!({}));
    world.seed_job(
        "j2",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_dependency("j2", "j1", DependencyType::CompletionRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    world.worker().run_until_idle().await;

    // J1 failed, but its completion satisfied the tolerant dependency
    assert_eq!(world.job("j1").status, JobStatus::Failed);
    assert_eq!(world.job("j2").status, JobStatus::Succeeded);

    // One FAILED plus one SUCCEEDED resolves to a partial outcome
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Partial);
    world.assert_invariants();
}

#[tokio::test]
async fn completion_required_chain_without_failures_succeeds() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_pipeline("p1");
    world.seed_job(
        "j1",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_job(
        "j2",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_dependency("j2", "j1", DependencyType::CompletionRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    world.worker().run_until_idle().await;

    assert_eq!(world.job("j1").status, JobStatus::Succeeded);
    assert_eq!(world.job("j2").status, JobStatus::Succeeded);
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Succeeded);
    world.assert_invariants();
}

#[tokio::test]
async fn skipped_predecessor_still_blocks_completion_required() {
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
    // j2 requires j1's success; j3 tolerates j2's failure but not a skip
    world.seed_dependency("j2", "j1", DependencyType::SuccessRequired);
    world.seed_dependency("j3", "j2", DependencyType::CompletionRequired);

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
