// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests: a context wired to fakes, plus seed
//! helpers for jobs, pipelines, and domain rows.

use crate::config::Config;
use crate::context::{Clients, JobContext};
use crate::job_manager::JobManager;
use crate::pipeline_manager::PipelineManager;
use crate::pool::BlockingPool;
use crate::registry::JobRegistry;
use crate::worker::Worker;
use mj_adapters::{
    FakeAlleleRegistry, FakeClinvarClient, FakeGnomadClient, FakeLdhClient, FakeObjectStore,
    FakeScoreDataParser, FakeUniprotClient, FakeVariantMapper, MemoryQueue,
};
use mj_core::test_support;
use mj_core::{
    Clock as _, DependencyType, FakeClock, JobDependency, JobId, JobRun, PipelineId,
    SequentialIdGen,
};
use mj_storage::Session;
use serde_json::Value;
use std::sync::Arc;

pub struct Harness {
    pub ctx: JobContext,
    pub clock: FakeClock,
    pub queue: Arc<MemoryQueue>,
    pub mapper: Arc<FakeVariantMapper>,
    pub allele_registry: Arc<FakeAlleleRegistry>,
    pub ldh: Arc<FakeLdhClient>,
    pub gnomad: Arc<FakeGnomadClient>,
    pub uniprot: Arc<FakeUniprotClient>,
    pub clinvar: Arc<FakeClinvarClient>,
    pub objects: Arc<FakeObjectStore>,
    pub scores: Arc<FakeScoreDataParser>,
    pub registry: Arc<JobRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        let config = Config {
            car_submission_endpoint: Some("https://reg.test".to_string()),
            ldh_submission_endpoint: Some("https://ldh.test".to_string()),
            linking_backoff_in_seconds: 60,
            linked_data_retry_threshold: 0.5,
            enqueue_backoff_attempt_limit: 3,
            ..Config::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let clock = FakeClock::new();
        let queue = Arc::new(MemoryQueue::new(Arc::new(clock.clone())));
        let mapper = Arc::new(FakeVariantMapper::default());
        let allele_registry = Arc::new(FakeAlleleRegistry::default());
        let ldh = Arc::new(FakeLdhClient::default());
        let gnomad = Arc::new(FakeGnomadClient::default());
        let clinvar = Arc::new(FakeClinvarClient::default());
        let uniprot = Arc::new(FakeUniprotClient::default());
        let objects = Arc::new(FakeObjectStore::default());
        let scores = Arc::new(FakeScoreDataParser::default());

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
                uniprot: uniprot.clone(),
                clinvar: clinvar.clone(),
                objects: objects.clone(),
                scores: scores.clone(),
            },
            config: Arc::new(config),
        };

        let mut registry = JobRegistry::new();
        crate::jobs::register_all(&mut registry);

        Self {
            ctx,
            clock,
            queue,
            mapper,
            allele_registry,
            ldh,
            gnomad,
            uniprot,
            clinvar,
            objects,
            scores,
            registry: Arc::new(registry),
        }
    }

    pub fn worker(&self) -> Worker {
        Worker::new(self.ctx.clone(), self.registry.clone())
    }

    pub fn commit(&self) {
        self.ctx.db.commit().unwrap();
    }

    pub fn seed_job(&self, id: &str, function: &str, pipeline: Option<&str>, params: Value) -> JobRun {
        let mut job = test_support::job_run(id, function, pipeline, params);
        job.created_at = self.clock.now();
        self.ctx.db.upsert_job_run(&job);
        self.commit();
        job
    }

    pub fn seed_pipeline(&self, id: &str) {
        let mut pipeline = test_support::pipeline(id);
        pipeline.created_at = self.clock.now();
        self.ctx.db.upsert_pipeline(&pipeline);
        self.commit();
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

    pub fn seed_target_gene(&self, id: &str, score_set: &str, name: &str) -> mj_core::TargetGene {
        let gene = test_support::target_gene(id, score_set, name);
        self.ctx.db.upsert_target_gene(&gene);
        self.commit();
        gene
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

    pub fn job(&self, id: &str) -> JobRun {
        self.ctx.db.job_run(&JobId::new(id)).unwrap()
    }

    pub fn job_manager(&self, id: &str) -> JobManager {
        self.ctx.job_manager(&JobId::new(id)).unwrap()
    }

    pub fn pipeline_manager(&self, id: &str) -> PipelineManager {
        self.ctx.pipeline_manager(&PipelineId::new(id)).unwrap()
    }
}
