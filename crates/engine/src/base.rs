// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state composed into both managers.

use mj_adapters::JobQueue;
use mj_core::Clock;
use mj_storage::Session;
use std::sync::Arc;

/// Database session, queue gateway, and clock handles shared by the job
/// and pipeline managers.
#[derive(Clone)]
pub struct ManagerBase {
    pub db: Session,
    pub queue: Arc<dyn JobQueue>,
    pub clock: Arc<dyn Clock>,
}

impl ManagerBase {
    pub fn new(db: Session, queue: Arc<dyn JobQueue>, clock: Arc<dyn Clock>) -> Self {
        Self { db, queue, clock }
    }
}
