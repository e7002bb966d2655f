// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for pipeline specs: a worker context wired to fakes.

use mj_adapters::{
    FakeAlleleRegistry, FakeClinvarClient, FakeGnomadClient, FakeLdhClient, FakeObjectStore,
    FakeScoreDataParser, FakeUniprotClient, FakeVariantMapper, MemoryQueue,
};
use mj_core::test_support;
use mj_core::{
    Clock as _, DependencyType, FakeClock, JobDependency, JobId, JobRun, PipelineId,
    SequentialIdGen,
};
use mj_engine::{jobs, BlockingPool, Clients, Config, JobContext, JobRegistry, Worker};
use mj_storage::Session;
use serde_json::Value;
use std::sync::Arc;

pub struct SpecWorld {
    pub ctx: JobContext,
    pub clock: FakeClock,
    pub queue: Arc<MemoryQueue>,
    pub mapper: Arc<FakeVariantMapper>,
    pub allele_registry: Arc<FakeAlleleRegistry>,
    pub ldh: Arc<FakeLdhClient>,
    pub gnomad: Arc<FakeGnomadClient>,
    pub registry: Arc<JobRegistry>,
}

impl SpecWorld {
    pub fn new() -> Self {
        let config = Config {
            car_submission_endpoint: Some("https://reg.test".to_string()),
            ldh_submission_endpoint: Some("https://ldh.test".to_string()),
            linked_data_retry_threshold: 0.5,
            linking_backoff_in_seconds: 60,
            enqueue_backoff_attempt_limit: 3,
            ..Config::default()
        };

        let clock = FakeClock::new();
        let queue = Arc::new(MemoryQueue::new(Arc::new(clock.clone())));
        let mapper = Arc::new(FakeVariantMapper::default());
        let allele_registry = Arc::new(FakeAlleleRegistry::default());
        let ldh = Arc::new(FakeLdhClient::default());
        let gnomad = Arc::new(FakeGnomadClient::default());

        let ctx = JobContext {
            db: Session::in_memory(),
            queue: queue.clone(),
            clock: Arc::new(clock.clone()),
            ids: Arc::new(SequentialIdGen::new("gen")),
            pool: BlockingPool::new(2),
            clients: Clients {
                mapper: mapper.clone(),
                allele_registry: allele_registry.clone(),
                ldh: ldh.clone(),
                gnomad: gnomad.clone(),
                uniprot: Arc::new(FakeUniprotClient::default()),
                clinvar: Arc::new(FakeClinvarClient::default()),
                objects: Arc::new(FakeObjectStore::default()),
                scores: Arc::new(FakeScoreDataParser::default()),
            },
            config: Arc::new(config),
        };

        let mut registry = JobRegistry::new();
        jobs::register_all(&mut registry);

        Self {
            ctx,
            clock,
            queue,
            mapper,
            allele_registry,
            ldh,
            gnomad,
            registry: Arc::new(registry),
        }
    }

    pub fn worker(&self) -> Worker {
        Worker::new(self.ctx.clone(), self.registry.clone())
    }

    pub fn commit(&self) {
        self.ctx.db.commit().unwrap();
    }

    pub fn seed_pipeline(&self, id: &str) {
        let mut pipeline = test_support::pipeline(id);
        pipeline.created_at = self.clock.now();
        self.ctx.db.upsert_pipeline(&pipeline);
        self.commit();
    }

    /// Seed a job; creation times follow the fake clock so listings are
    /// deterministic.
    pub fn seed_job(&self, id: &str, function: &str, pipeline: Option<&str>, params: Value) -> JobRun {
        self.clock.advance_secs(1);
        let mut job = test_support::job_run(id, function, pipeline, params);
        job.created_at = self.clock.now();
        self.ctx.db.upsert_job_run(&job);
        self.commit();
        job
    }

    pub fn seed_dependency(&self, job: &str, depends_on: &str, ty: DependencyType) {
        self.ctx
            .db
            .insert_dependency(&JobDependency::new(job, depends_on, ty));
        self.commit();
    }

    pub fn seed_score_set(&self, id: &str) -> mj_core::ScoreSet {
        let score_set = test_support::score_set(id);
        self.ctx.db.upsert_score_set(&score_set);
        self.commit();
        score_set
    }

    pub fn seed_target_gene(&self, id: &str, score_set: &str, name: &str) {
        self.ctx
            .db
            .upsert_target_gene(&test_support::target_gene(id, score_set, name));
        self.commit();
    }

    pub fn seed_variant(&self, id: &str, score_set: &str) -> mj_core::Variant {
        let variant = test_support::variant(id, score_set);
        self.ctx.db.upsert_variant(&variant);
        self.commit();
        variant
    }

    pub fn seed_mapped_variant(&self, id: &str, variant: &str, hgvs: &str) -> mj_core::MappedVariant {
        let mut mapped = test_support::mapped_variant(id, variant, hgvs);
        mapped.mapped_date = self.clock.now();
        self.ctx.db.upsert_mapped_variant(&mapped);
        self.commit();
        mapped
    }

    /// Enqueue a seeded job the way a controller would, deduped on its urn.
    pub async fn enqueue(&self, job: &JobRun) {
        use mj_adapters::JobQueue;
        self.queue
            .enqueue(
                &job.job_function,
                &job.id,
                std::time::Duration::ZERO,
                &job.urn,
            )
            .await
            .unwrap();
    }

    /// Dispatch exactly one ready queue entry, if any.
    pub async fn step(&self) -> Option<String> {
        let entry = self.queue.pop_ready()?;
        let outcome = mj_engine::dispatch(&self.ctx, &self.registry, &entry.function, &entry.job_id).await;
        self.queue.finish(&entry.client_job_id);
        if let Err(error) = outcome {
            eprintln!("dispatch of {} failed: {error}", entry.function);
        }
        Some(entry.function)
    }

    pub fn job(&self, id: &str) -> JobRun {
        self.ctx.db.job_run(&JobId::new(id)).unwrap()
    }

    pub fn pipeline_manager(&self, id: &str) -> mj_engine::PipelineManager {
        self.ctx.pipeline_manager(&PipelineId::new(id)).unwrap()
    }

    /// Assert the orchestrator invariants that must hold at any quiescent
    /// point: terminal exclusivity, skip correctness, dependency safety,
    /// and current-row uniqueness.
    pub fn assert_invariants(&self) {
        let state = self.ctx.db.snapshot();

        for job in state.job_runs.values() {
            // Terminal exclusivity
            assert_eq!(
                job.finished_at.is_some(),
                job.status.is_terminal(),
                "job {}: finished_at set iff terminal (status {})",
                job.id,
                job.status
            );

            // Skip correctness: every skipped job either has an
            // unreachable predecessor or was skipped by a bulk cancel of
            // a failed/cancelled pipeline
            if job.status == mj_core::JobStatus::Skipped {
                let has_unreachable_dependency = state
                    .dependencies_with_predecessors(job.id.as_str())
                    .iter()
                    .any(|(dep, predecessor)| {
                        mj_core::unreachable_reason(
                            dep.dependency_type,
                            predecessor.status,
                            &predecessor.urn,
                        )
                        .is_some()
                    });
                let pipeline_terminated = job
                    .pipeline_id
                    .as_ref()
                    .and_then(|p| state.pipelines.get(p.as_str()))
                    .is_some_and(|p| {
                        matches!(
                            p.status,
                            mj_core::PipelineStatus::Failed | mj_core::PipelineStatus::Cancelled
                        )
                    });
                assert!(
                    has_unreachable_dependency || pipeline_terminated,
                    "job {} skipped without an unreachable predecessor",
                    job.id
                );
            }

            // Dependency safety: no running/succeeded job with a
            // predecessor that violates its dependency type
            if matches!(
                job.status,
                mj_core::JobStatus::Running | mj_core::JobStatus::Succeeded
            ) {
                for (dep, predecessor) in state.dependencies_with_predecessors(job.id.as_str()) {
                    assert!(
                        mj_core::unreachable_reason(
                            dep.dependency_type,
                            predecessor.status,
                            &predecessor.urn
                        )
                        .is_none(),
                        "job {} ran despite unreachable predecessor {}",
                        job.id,
                        predecessor.id
                    );
                }
            }
        }

        // Current mapped-variant uniqueness
        for variant in state.variants.values() {
            let currents = state
                .mapped_variants
                .values()
                .filter(|m| m.variant_id == variant.id && m.current)
                .count();
            assert!(
                currents <= 1,
                "variant {} has {} current mapped variants",
                variant.id,
                currents
            );
        }

        // Annotation currency uniqueness per (variant, type)
        for annotation in state.annotations.values().filter(|a| a.current) {
            let duplicates = state
                .annotations
                .values()
                .filter(|other| {
                    other.current
                        && other.variant_id == annotation.variant_id
                        && other.annotation_type == annotation.annotation_type
                })
                .count();
            assert_eq!(
                duplicates, 1,
                "variant {} has duplicate current annotations",
                annotation.variant_id
            );
        }
    }
}
