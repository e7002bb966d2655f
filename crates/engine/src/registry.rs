// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry of job functions.
//!
//! Names are stable identifiers persisted on job run rows; registration
//! happens once at worker start.

use crate::context::JobContext;
use crate::error::JobError;
use crate::job_manager::JobManager;
use mj_core::{JobId, JobResult};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<JobResult, JobError>> + Send>>;
pub type JobFn = Arc<dyn Fn(JobContext, JobId, JobManager) -> JobFuture + Send + Sync>;

#[derive(Default)]
pub struct JobRegistry {
    functions: HashMap<String, JobFn>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &str, f: F)
    where
        F: Fn(JobContext, JobId, JobManager) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobResult, JobError>> + Send + 'static,
    {
        self.functions.insert(
            name.to_string(),
            Arc::new(move |ctx, job_id, job_manager| Box::pin(f(ctx, job_id, job_manager))),
        );
    }

    pub fn get(&self, name: &str) -> Option<JobFn> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
