// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenarios: linkage failure ratio under and over the retry threshold.

use crate::prelude::SpecWorld;
use mj_core::JobStatus;
use serde_json::json;

/// Seed a mapped score set with `total` variants, of which the first
/// `linked` resolve to a ClinGen variation, then enqueue the linkage job.
async fn seed_linkage_world(world: &SpecWorld, linked: usize, total: usize) {
    world.seed_score_set("ss-1");
    for i in 1..=total {
        let variant_id = format!("v{i}");
        world.seed_variant(&variant_id, "ss-1");
        world.seed_mapped_variant(&format!("m{i}"), &variant_id, &format!("g.{i}A>T"));
        if i <= linked {
            world.ldh.set_variation(
                &format!("urn:mavejobs:variant:v{i}"),
                json!({"id": format!("CA{i:04}")}),
            );
        }
    }
    let job = world.seed_job(
        "link",
        "link_clingen_variants",
        None,
        json!({"score_set_id": "ss-1", "correlation_id": "corr-1", "attempt": 1}),
    );
    world.enqueue(&job).await;
}

#[tokio::test]
async fn failures_under_threshold_chain_gnomad_without_retry() {
    let world = SpecWorld::new();
    // 30 of 100 fail: 0.30 < 0.50
    seed_linkage_world(&world, 70, 100).await;

    world.worker().run_until_idle().await;

    let link = world.job("link");
    assert_eq!(link.status, JobStatus::Succeeded);
    let result = link.result().unwrap();
    assert_eq!(result.data()["success"], true);
    assert_eq!(result.data()["retried"], false);
    assert!(result.data()["enqueued_job"].is_string());

    // The gnomAD job ran as the chained successor
    let enqueued_id = result.data()["enqueued_job"].as_str().unwrap().to_string();
    let gnomad_job = world.ctx.db.job_run(&enqueued_id.as_str().into()).unwrap();
    assert_eq!(gnomad_job.job_function, "link_gnomad_variants");
    assert_eq!(gnomad_job.status, JobStatus::Succeeded);
    world.assert_invariants();
}

#[tokio::test]
async fn failures_over_threshold_schedule_a_deferred_retry() {
    let world = SpecWorld::new();
    // 70 of 100 fail: 0.70 > 0.50
    seed_linkage_world(&world, 30, 100).await;

    world.worker().run_until_idle().await;

    let link = world.job("link");
    assert_eq!(link.status, JobStatus::Failed);
    let result = link.result().unwrap();
    assert_eq!(result.data()["success"], false);
    assert_eq!(result.data()["retried"], true);
    assert_eq!(link.job_params["attempt"], 2);

    // The retry is deferred by attempt * backoff = 60s
    assert!(world.queue.pop_ready().is_none());
    world.clock.advance_secs(60);

    // Second attempt succeeds once the variations resolve
    for i in 1..=100 {
        world.ldh.set_variation(
            &format!("urn:mavejobs:variant:v{i}"),
            json!({"id": format!("CA{i:04}")}),
        );
    }
    world.worker().run_until_idle().await;

    let link = world.job("link");
    assert_eq!(link.status, JobStatus::Succeeded);
    assert_eq!(link.retry_count, 1);
    assert_eq!(link.job_params["attempt"], 2);
    world.assert_invariants();
}

#[tokio::test]
async fn retries_stop_at_the_attempt_limit() {
    let world = SpecWorld::new();
    seed_linkage_world(&world, 0, 10).await;

    // Attempt 1 fails and schedules attempt 2; attempt 2 fails and
    // schedules attempt 3; attempt 3 is the limit and stops retrying.
    for _ in 0..3 {
        world.worker().run_until_idle().await;
        world.clock.advance_secs(1000);
    }

    let link = world.job("link");
    assert_eq!(link.status, JobStatus::Failed);
    let result = link.result().unwrap();
    assert_eq!(result.data()["retried"], false);
    assert!(world.queue.is_empty());
    world.assert_invariants();
}
