// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-variant annotation status tracking for the external-service jobs.

use crate::error::ManagerError;
use mj_core::{
    AnnotationId, AnnotationRecord, AnnotationStatus, AnnotationType, Clock, IdGen, VariantId,
};
use mj_storage::Session;
use serde_json::Value;
use std::sync::Arc;

/// Records `(variant, annotation_type, version, status)` rows.
///
/// For a given `(variant, annotation_type)` at most one row has
/// `current = true`; adding a current annotation flips any prior current
/// row first.
pub struct AnnotationStatusManager {
    db: Session,
    ids: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
}

impl AnnotationStatusManager {
    pub fn new(db: Session, ids: Arc<dyn IdGen>, clock: Arc<dyn Clock>) -> Self {
        Self { db, ids, clock }
    }

    pub fn add_annotation(
        &self,
        variant_id: &VariantId,
        annotation_type: AnnotationType,
        version: &str,
        status: AnnotationStatus,
        annotation_data: Value,
        current: bool,
    ) -> Result<AnnotationId, ManagerError> {
        if current {
            if let Some(mut prior) = self.db.current_annotation(variant_id, annotation_type) {
                prior.current = false;
                self.db.upsert_annotation(&prior);
            }
        }

        let annotation = AnnotationRecord {
            id: AnnotationId::new(self.ids.next()),
            variant_id: variant_id.clone(),
            annotation_type,
            version: version.to_string(),
            status,
            annotation_data,
            current,
            created_at: self.clock.now(),
        };
        self.db.upsert_annotation(&annotation);
        self.db
            .flush()
            .map_err(|e| ManagerError::StatePersistence(e.to_string()))?;

        tracing::debug!(
            variant_id = %variant_id,
            annotation_type = ?annotation_type,
            version,
            status = ?status,
            "recorded annotation status"
        );
        Ok(annotation.id)
    }
}

#[cfg(test)]
#[path = "annotation_tests.rs"]
mod tests;
