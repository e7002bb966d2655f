// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slim typed views of the domain rows the job functions touch.
//!
//! The orchestrator treats these as opaque records reached through the
//! persistence gateway; only the fields the worker reads or writes are
//! modeled here.

use crate::id::{AnnotationId, ControlId, MappedVariantId, ScoreSetId, TargetGeneId, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Score-set variant processing state, visible to external observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Incomplete,
    Processing,
    Failed,
    Success,
}

/// Score-set VRS mapping state, visible to external observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingState {
    NotAttempted,
    Queued,
    Processing,
    Failed,
    Incomplete,
    Complete,
}

/// Biological coordinate space of a mapped reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLayer {
    Genomic,
    Cdna,
    Protein,
}

impl fmt::Display for AnnotationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationLayer::Genomic => write!(f, "genomic"),
            AnnotationLayer::Cdna => write!(f, "cdna"),
            AnnotationLayer::Protein => write!(f, "protein"),
        }
    }
}

/// Kind of external enrichment an annotation row records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    ClinvarControl,
    UniprotMapping,
    GnomadLinkage,
}

/// Per-variant outcome of an external enrichment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    Success,
    Failed,
    Skipped,
}

/// A score set row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub id: ScoreSetId,
    pub urn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_state: Option<ProcessingState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_state: Option<MappingState>,
    /// Operator-facing error detail written by the variant-creation job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_errors: Option<Value>,
}

impl ScoreSet {
    pub fn new(id: impl Into<ScoreSetId>, urn: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            urn: urn.into(),
            processing_state: None,
            mapping_state: None,
            processing_errors: None,
        }
    }
}

/// A target gene row with its mapped reference metadata per layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGene {
    pub id: TargetGeneId,
    pub score_set_id: ScoreSetId,
    pub name: String,
    #[serde(default)]
    pub pre_mapped_metadata: HashMap<AnnotationLayer, Value>,
    #[serde(default)]
    pub post_mapped_metadata: HashMap<AnnotationLayer, Value>,
    /// UniProt id resolved from the post-mapped accession
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_id: Option<String>,
}

impl TargetGene {
    pub fn new(
        id: impl Into<TargetGeneId>,
        score_set_id: impl Into<ScoreSetId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            score_set_id: score_set_id.into(),
            name: name.into(),
            pre_mapped_metadata: HashMap::new(),
            post_mapped_metadata: HashMap::new(),
            uniprot_id: None,
        }
    }
}

/// A single HGVS-denoted change belonging to a score set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub urn: String,
    pub score_set_id: ScoreSetId,
    /// Standardized scores/counts row produced by validation
    pub data: Value,
}

/// One standardized row handed back by the score-data parser, before it is
/// given an identity and attached to a score set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInput {
    pub data: Value,
}

/// A variant's VRS representation and external identifiers.
///
/// At most one record per underlying variant may have `current = true`;
/// re-mapping flips the old current row before inserting the new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedVariant {
    pub id: MappedVariantId,
    pub variant_id: VariantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_mapped: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_mapped: Option<Value>,
    pub current: bool,
    pub mapped_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrs_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clingen_allele_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A versioned clinical-control row (e.g. one ClinVar snapshot month)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalControl {
    pub id: ControlId,
    pub db_name: String,
    pub db_identifier: String,
    /// Snapshot version, `MM_YYYY`
    pub db_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_review_status: Option<String>,
}

/// Per-variant, per-annotation-type status row.
///
/// For a given `(variant_id, annotation_type)` at most one row has
/// `current = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub variant_id: VariantId,
    pub annotation_type: AnnotationType,
    /// Free-form version, e.g. "08_2024" for ClinVar snapshots
    pub version: String,
    pub status: AnnotationStatus,
    pub annotation_data: Value,
    pub current: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod tests;
