// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting invariants: commit discipline, retry monotonicity, and
//! aggregate correctness over a mixed pipeline trace.

use crate::prelude::SpecWorld;
use mj_core::{DependencyType, JobStatus, PipelineStatus};
use serde_json::json;

#[tokio::test]
async fn dispatch_commits_once_per_phase_on_the_success_path() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    let job = world.seed_job(
        "j1",
        "link_gnomad_variants",
        None,
        json!({"score_set_id": "ss-1"}),
    );
    world.enqueue(&job).await;

    let commits_before = world.ctx.db.commit_count();
    world.worker().run_until_idle().await;

    // Start and outcome each commit exactly once; no pipeline, so no
    // coordination commit
    assert_eq!(world.ctx.db.commit_count(), commits_before + 2);
}

#[tokio::test]
async fn dispatch_commits_once_per_phase_on_the_failure_path() {
    let world = SpecWorld::new();
    let job = world.seed_job("j1", "link_gnomad_variants", None, json!({}));
    world.enqueue(&job).await;

    let commits_before = world.ctx.db.commit_count();
    world.worker().run_until_idle().await;

    assert_eq!(world.job("j1").status, JobStatus::Failed);
    assert_eq!(world.ctx.db.commit_count(), commits_before + 2);
}

#[tokio::test]
async fn retry_history_matches_retry_counts() {
    let world = SpecWorld::new();
    world.seed_pipeline("p1");
    world.seed_job("j1", "link_gnomad_variants", Some("p1"), json!({}));

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    // Fail, retry, fail again, retry again
    for expected_retries in 1..=2u32 {
        world.worker().run_until_idle().await;
        assert_eq!(world.job("j1").status, JobStatus::Failed);

        manager.retry_failed_jobs().await.unwrap();
        world.commit();

        let job = world.job("j1");
        assert_eq!(job.retry_count, expected_retries);
        let history = job.retry_history();
        assert_eq!(history.len(), expected_retries as usize);
        for (index, entry) in history.iter().enumerate() {
            assert_eq!(entry.attempt, index as u32 + 1);
        }
    }
    world.assert_invariants();
}

#[tokio::test]
async fn aggregate_status_matches_job_statuses_at_every_quiescent_point() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    world.seed_pipeline("p1");
    // A diamond: ok-a and fail-b fan out, join tolerates b's failure,
    // strict requires b's success
    world.seed_job(
        "ok-a",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_job("fail-b", "link_gnomad_variants", Some("p1"), json!({}));
    world.seed_job(
        "join",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_job(
        "strict",
        "link_gnomad_variants",
        Some("p1"),
        json!({"score_set_id": "ss-1"}),
    );
    world.seed_dependency("join", "ok-a", DependencyType::SuccessRequired);
    world.seed_dependency("join", "fail-b", DependencyType::CompletionRequired);
    world.seed_dependency("strict", "fail-b", DependencyType::SuccessRequired);

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();

    world.worker().run_until_idle().await;

    assert_eq!(world.job("ok-a").status, JobStatus::Succeeded);
    assert_eq!(world.job("fail-b").status, JobStatus::Failed);
    assert_eq!(world.job("join").status, JobStatus::Succeeded);
    assert_eq!(world.job("strict").status, JobStatus::Skipped);

    // SUCCEEDED + FAILED + SKIPPED at quiescence resolves to PARTIAL
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Partial);
    world.assert_invariants();
}

#[tokio::test]
async fn terminal_pipelines_stay_terminal_without_explicit_retry() {
    let world = SpecWorld::new();
    world.seed_pipeline("p1");
    world.seed_job("j1", "link_gnomad_variants", Some("p1"), json!({}));

    let manager = world.pipeline_manager("p1");
    manager.start_pipeline(true).await.unwrap();
    world.commit();
    world.worker().run_until_idle().await;
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Failed);

    // Further coordinations never revive a terminal pipeline
    manager.coordinate_pipeline().await.unwrap();
    world.commit();
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Failed);

    // Explicit retry is the sanctioned way back to RUNNING
    manager.retry_failed_jobs().await.unwrap();
    world.commit();
    assert_eq!(manager.pipeline_status().unwrap(), PipelineStatus::Running);
}
