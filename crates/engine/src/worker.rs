// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loop: polls the queue and dispatches registered job functions.

use crate::context::JobContext;
use crate::dispatch::dispatch;
use crate::registry::JobRegistry;
use mj_adapters::QueueEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Single-process worker.
///
/// Concurrency within the process is cooperative; blocking work is
/// offloaded through the context's pool. Multiple worker processes may
/// poll the same queue concurrently, coordinated only through the store
/// and the queue's dedup.
pub struct Worker {
    ctx: JobContext,
    registry: Arc<JobRegistry>,
}

impl Worker {
    pub fn new(ctx: JobContext, registry: Arc<JobRegistry>) -> Self {
        Self { ctx, registry }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    async fn dispatch_entry(&self, entry: &QueueEntry) {
        tracing::info!(function = %entry.function, job_id = %entry.job_id, "dispatching job");
        let outcome = dispatch(&self.ctx, &self.registry, &entry.function, &entry.job_id).await;
        // Release the dedup hold only after the dispatch has fully
        // returned, so concurrent enqueues for this urn keep coalescing
        // while the job is in flight.
        self.ctx.queue.finish(&entry.client_job_id);

        match outcome {
            Ok(_) => {
                tracing::info!(function = %entry.function, job_id = %entry.job_id, "job dispatch completed")
            }
            Err(error) => {
                tracing::error!(
                    function = %entry.function,
                    job_id = %entry.job_id,
                    %error,
                    "job dispatch failed"
                )
            }
        }
    }

    /// Dispatch every currently ready entry, returning the count handled.
    ///
    /// Entries enqueued during processing are handled too; deferred
    /// entries whose time has not come are left waiting.
    pub async fn run_until_idle(&self) -> usize {
        let mut dispatched = 0;
        while let Some(entry) = self.ctx.queue.pop_ready() {
            self.dispatch_entry(&entry).await;
            dispatched += 1;
        }
        dispatched
    }

    /// Poll until `shutdown` is notified.
    pub async fn run(&self, shutdown: Arc<Notify>) {
        let interval = Duration::from_millis(self.ctx.config.poll_interval_ms.max(1));
        tracing::info!(functions = ?self.registry.names(), "worker loop started");
        loop {
            self.run_until_idle().await;
            tokio::select! {
                _ = shutdown.notified() => {
                    tracing::info!("worker loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
