// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work queue gateway.
//!
//! The gateway deduplicates on the client-side job id (the job run's urn):
//! a second enqueue while an instance is still queued or in flight is a
//! reported no-op, so racing coordinators and retries coalesce.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mj_core::{Clock, JobId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue rejected enqueue for {client_job_id}: {reason}")]
    Rejected {
        client_job_id: String,
        reason: String,
    },
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job function invocation.
    ///
    /// `defer` delays execution by at least the given duration.
    /// Returns `Ok(true)` when the entry was accepted, `Ok(false)` when it
    /// coalesced with an existing queued or in-flight entry carrying the
    /// same `client_job_id`.
    async fn enqueue(
        &self,
        function: &str,
        job_id: &JobId,
        defer: Duration,
        client_job_id: &str,
    ) -> Result<bool, QueueError>;
}

/// One dequeued invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub function: String,
    pub job_id: JobId,
    pub client_job_id: String,
    pub ready_at: DateTime<Utc>,
}

struct QueueInner {
    entries: Vec<QueueEntry>,
    /// Client job ids queued or dispatched but not yet finished
    in_flight: HashSet<String>,
}

/// In-process queue backing a single logical work queue.
///
/// Workers pop ready entries and must call [`MemoryQueue::finish`] once the
/// dispatch returns so the dedup hold is released.
pub struct MemoryQueue {
    inner: Mutex<QueueInner>,
    clock: Arc<dyn Clock>,
}

impl MemoryQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                entries: Vec::new(),
                in_flight: HashSet::new(),
            }),
            clock,
        }
    }

    /// Pop the earliest entry whose defer has elapsed.
    pub fn pop_ready(&self) -> Option<QueueEntry> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let idx = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.ready_at <= now)
            .min_by_key(|(_, e)| e.ready_at)
            .map(|(i, _)| i)?;
        Some(inner.entries.remove(idx))
    }

    /// Release the dedup hold after a dispatch has returned.
    pub fn finish(&self, client_job_id: &str) {
        self.inner.lock().in_flight.remove(client_job_id);
    }

    /// Number of entries waiting (ready or deferred)
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Earliest ready time among waiting entries
    pub fn next_ready_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().entries.iter().map(|e| e.ready_at).min()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(
        &self,
        function: &str,
        job_id: &JobId,
        defer: Duration,
        client_job_id: &str,
    ) -> Result<bool, QueueError> {
        let ready_at = self.clock.now()
            + ChronoDuration::from_std(defer).map_err(|e| QueueError::Rejected {
                client_job_id: client_job_id.to_string(),
                reason: format!("defer out of range: {e}"),
            })?;

        let mut inner = self.inner.lock();
        if inner.in_flight.contains(client_job_id) {
            tracing::debug!(client_job_id, function, "enqueue coalesced with existing entry");
            return Ok(false);
        }

        inner.in_flight.insert(client_job_id.to_string());
        inner.entries.push(QueueEntry {
            function: function.to_string(),
            job_id: job_id.clone(),
            client_job_id: client_job_id.to_string(),
            ready_at,
        });
        tracing::debug!(client_job_id, function, ?defer, "enqueued job");
        Ok(true)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
