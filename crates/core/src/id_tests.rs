// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn job_id_display() {
    let id = JobId::new("job-1");
    assert_eq!(id.to_string(), "job-1");
}

#[test]
fn job_id_equality() {
    let id1 = JobId::new("job-1");
    let id2 = JobId::new("job-1");
    let id3 = JobId::new("job-2");

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn job_id_from_str() {
    let id: JobId = "job".into();
    assert_eq!(id.as_str(), "job");
}

#[test]
fn job_id_serde() {
    let id = JobId::new("my-job");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-job\"");

    let parsed: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn uuid_id_gen_produces_unique_ids() {
    let id_gen = UuidIdGen;
    let a = id_gen.next();
    let b = id_gen.next();
    assert_ne!(a, b);
}

#[test]
fn sequential_id_gen_counts_up() {
    let id_gen = SequentialIdGen::new("job");
    assert_eq!(id_gen.next(), "job-1");
    assert_eq!(id_gen.next(), "job-2");
    assert_eq!(id_gen.next(), "job-3");
}

#[test]
fn sequential_id_gen_clones_share_counter() {
    let id_gen = SequentialIdGen::new("x");
    let clone = id_gen.clone();
    assert_eq!(id_gen.next(), "x-1");
    assert_eq!(clone.next(), "x-2");
}
