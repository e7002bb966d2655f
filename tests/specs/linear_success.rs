// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: a two-job chain where the dependent waits for its
//! predecessor to succeed.

use crate::prelude::SpecWorld;
use mj_core::{DependencyType, JobStatus, PipelineStatus};
use serde_json::json;

#[tokio::test]
async fn linear_pipeline_runs_to_success() {
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
    world.seed_dependency("j2", "j1", DependencyType::SuccessRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    // Only the independent job is enqueued at start
    assert_eq!(world.job("j1").status, JobStatus::Queued);
    assert_eq!(world.job("j2").status, JobStatus::Pending);
    assert_eq!(world.queue.len(), 1);

    // J1 runs and succeeds; coordination enqueues J2
    assert_eq!(world.step().await.as_deref(), Some("link_gnomad_variants"));
    assert_eq!(world.job("j1").status, JobStatus::Succeeded);
    assert_eq!(world.job("j2").status, JobStatus::Queued);
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Running);

    // J2 runs after J1 finished
    world.clock.advance_secs(5);
    assert!(world.step().await.is_some());
    assert!(world.step().await.is_none());

    let j1 = world.job("j1");
    let j2 = world.job("j2");
    assert_eq!(j1.status, JobStatus::Succeeded);
    assert_eq!(j2.status, JobStatus::Succeeded);
    assert!(j2.started_at.unwrap() > j1.finished_at.unwrap());
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Succeeded);

    let pipeline = manager.pipeline().unwrap();
    assert!(pipeline.finished_at.is_some());
    world.assert_invariants();
}
