// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size executor pool for blocking work.
//!
//! Every blocking client call goes through here so the cooperative worker
//! loop never stalls on network I/O.

use crate::error::JobError;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
}

impl BlockingPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
        }
    }

    /// Run a blocking closure on the pool, holding one permit for its
    /// duration.
    pub async fn run<T, F>(&self, f: F) -> Result<T, JobError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| JobError::Pool(format!("pool closed: {e}")))?;
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| JobError::Pool(format!("blocking task failed: {e}")))
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
