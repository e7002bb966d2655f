// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gnomAD population-frequency client.

use super::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One gnomAD record keyed by CAID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GnomadRecord {
    pub caid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_number: Option<u64>,
    /// Genomic context (faf95, popmax, filters) as returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Blocking client for gnomAD lookups
pub trait GnomadClient: Send + Sync {
    fn data_for_caids(&self, caids: &[String]) -> Result<Vec<GnomadRecord>, ClientError>;
}

pub struct HttpGnomadClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpGnomadClient {
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

impl GnomadClient for HttpGnomadClient {
    fn data_for_caids(&self, caids: &[String]) -> Result<Vec<GnomadRecord>, ClientError> {
        let url = format!("{}/variants/by-caid", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&caids)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}
