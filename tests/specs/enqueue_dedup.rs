// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: duplicate enqueues with the same urn coalesce.

use crate::prelude::SpecWorld;
use mj_adapters::JobQueue;
use mj_core::JobStatus;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn duplicate_enqueue_within_the_defer_window_is_a_noop() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    let job = world.seed_job(
        "j1",
        "link_gnomad_variants",
        None,
        json!({"score_set_id": "ss-1"}),
    );

    let first = world
        .queue
        .enqueue(
            &job.job_function,
            &job.id,
            Duration::from_secs(30),
            &job.urn,
        )
        .await
        .unwrap();
    let second = world
        .queue
        .enqueue(&job.job_function, &job.id, Duration::ZERO, &job.urn)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(world.queue.len(), 1);

    // Exactly one dequeue occurs
    world.clock.advance_secs(30);
    assert_eq!(world.worker().run_until_idle().await, 1);
    assert_eq!(world.job("j1").status, JobStatus::Succeeded);
    assert!(world.queue.is_empty());
}

#[tokio::test]
async fn dedup_holds_while_the_job_is_in_flight() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    let job = world.seed_job(
        "j1",
        "link_gnomad_variants",
        None,
        json!({"score_set_id": "ss-1"}),
    );
    world.enqueue(&job).await;

    // Pop without finishing: the job counts as running
    let entry = world.queue.pop_ready().unwrap();
    let coalesced = world
        .queue
        .enqueue(&job.job_function, &job.id, Duration::ZERO, &job.urn)
        .await
        .unwrap();
    assert!(!coalesced);

    // After the dispatch finishes, a retry enqueue is accepted again
    world.queue.finish(&entry.client_job_id);
    let accepted = world
        .queue
        .enqueue(&job.job_function, &job.id, Duration::ZERO, &job.urn)
        .await
        .unwrap();
    assert!(accepted);
}

#[tokio::test]
async fn racing_coordinators_coalesce_on_the_urn() {
    let world = SpecWorld::new();
    world.seed_score_set("ss-1");
    let job = world.seed_job(
        "j1",
        "link_gnomad_variants",
        None,
        json!({"score_set_id": "ss-1"}),
    );

    // Two coordinators race to enqueue the same ready job
    for _ in 0..2 {
        world
            .queue
            .enqueue(&job.job_function, &job.id, Duration::ZERO, &job.urn)
            .await
            .unwrap();
    }

    assert_eq!(world.queue.len(), 1);
    assert_eq!(world.worker().run_until_idle().await, 1);
}
