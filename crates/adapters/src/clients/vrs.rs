// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VRS mapping service client.

use super::ClientError;
use mj_core::AnnotationLayer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Per-variant mapping outcome from the mapping service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedScore {
    pub variant_urn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_mapped: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_mapped: Option<Value>,
    /// Set when this variant could not be mapped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Pre- and post-mapped reference metadata for one target gene,
/// keyed by annotation layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    #[serde(default)]
    pub pre_mapped: HashMap<AnnotationLayer, Value>,
    #[serde(default)]
    pub post_mapped: HashMap<AnnotationLayer, Value>,
}

/// Full mapping document for a score set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingResponse {
    #[serde(default)]
    pub mapped_scores: Vec<MappedScore>,
    /// Reference metadata per target gene id
    #[serde(default)]
    pub reference_sequences: HashMap<String, ReferenceMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrs_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Blocking client for the external VRS mapping service
pub trait VariantMapper: Send + Sync {
    fn map_score_set(&self, score_set_urn: &str) -> Result<MappingResponse, ClientError>;
}

pub struct HttpVariantMapper {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpVariantMapper {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

impl VariantMapper for HttpVariantMapper {
    fn map_score_set(&self, score_set_urn: &str) -> Result<MappingResponse, ClientError> {
        let url = format!("{}/api/v1/map/{}", self.base_url, score_set_urn);
        let response = self.client.post(&url).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}
