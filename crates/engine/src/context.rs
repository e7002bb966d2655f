// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared context handed to every job function.

use crate::config::Config;
use crate::error::ManagerError;
use crate::job_manager::JobManager;
use crate::pipeline_manager::PipelineManager;
use crate::pool::BlockingPool;
use mj_adapters::{
    AlleleRegistry, ClinvarClient, GnomadClient, JobQueue, LdhClient, MemoryQueue, ObjectStore,
    ScoreDataParser, UniprotClient, VariantMapper,
};
use mj_core::{Clock, IdGen, JobId, PipelineId};
use mj_storage::Session;
use std::sync::Arc;

/// External service client handles
#[derive(Clone)]
pub struct Clients {
    pub mapper: Arc<dyn VariantMapper>,
    pub allele_registry: Arc<dyn AlleleRegistry>,
    pub ldh: Arc<dyn LdhClient>,
    pub gnomad: Arc<dyn GnomadClient>,
    pub uniprot: Arc<dyn UniprotClient>,
    pub clinvar: Arc<dyn ClinvarClient>,
    pub objects: Arc<dyn ObjectStore>,
    pub scores: Arc<dyn ScoreDataParser>,
}

/// Everything a job function needs: the session, the queue, the clock and
/// id generator, the blocking pool, the client handles, and configuration.
#[derive(Clone)]
pub struct JobContext {
    pub db: Session,
    pub queue: Arc<MemoryQueue>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGen>,
    pub pool: BlockingPool,
    pub clients: Clients,
    pub config: Arc<Config>,
}

impl JobContext {
    /// The queue gateway as managers consume it
    pub fn job_queue(&self) -> Arc<dyn JobQueue> {
        self.queue.clone()
    }

    pub fn job_manager(&self, job_id: &JobId) -> Result<JobManager, ManagerError> {
        JobManager::new(
            self.db.clone(),
            self.job_queue(),
            self.clock.clone(),
            job_id.clone(),
        )
    }

    pub fn pipeline_manager(&self, pipeline_id: &PipelineId) -> Result<PipelineManager, ManagerError> {
        PipelineManager::new(
            self.db.clone(),
            self.job_queue(),
            self.clock.clone(),
            pipeline_id.clone(),
        )
    }
}
