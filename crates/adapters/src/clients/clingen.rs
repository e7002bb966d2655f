// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClinGen Allele Registry and Linked Data Hub clients.

use super::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Registry response for one submitted HGVS string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAllele {
    pub hgvs: String,
    /// Canonical allele id (CAID), absent when registration failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clingen_allele_id: Option<String>,
}

/// One LDH submission document: the (variant, mapped variant, hgvs) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdhSubmission {
    pub variant_urn: String,
    pub mapped_variant_id: String,
    pub hgvs: String,
}

/// Blocking client for the ClinGen Allele Registry
pub trait AlleleRegistry: Send + Sync {
    fn dispatch_submissions(&self, hgvs: &[String]) -> Result<Vec<RegisteredAllele>, ClientError>;

    /// ClinVar allele id associated with a CAID, if any
    fn associated_clinvar_allele_id(&self, caid: &str) -> Result<Option<String>, ClientError>;
}

/// Blocking client for the ClinGen Linked Data Hub
pub trait LdhClient: Send + Sync {
    fn authenticate(&self) -> Result<(), ClientError>;

    /// Dispatch documents in batches of `batch_size`.
    /// Returns the success count and the urns of failed submissions.
    fn dispatch_submissions(
        &self,
        submissions: &[LdhSubmission],
        batch_size: usize,
    ) -> Result<(usize, Vec<String>), ClientError>;

    /// Fetch the LDH variation linked to a variant urn
    fn clingen_variation(&self, variant_urn: &str) -> Result<Option<Value>, ClientError>;
}

/// Extract a CAID from an LDH variation document.
///
/// The id lives either at the top level or under the linked entity id.
pub fn clingen_allele_id_from_variation(variation: &Value) -> Option<String> {
    if let Some(id) = variation.get("id").and_then(Value::as_str) {
        if id.starts_with("CA") {
            return Some(id.to_string());
        }
    }
    variation
        .get("entId")
        .and_then(Value::as_str)
        .filter(|id| id.starts_with("CA"))
        .map(str::to_string)
}

pub struct HttpAlleleRegistry {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpAlleleRegistry {
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

impl AlleleRegistry for HttpAlleleRegistry {
    fn dispatch_submissions(&self, hgvs: &[String]) -> Result<Vec<RegisteredAllele>, ClientError> {
        let url = format!("{}/alleles?file=hgvs", self.base_url);
        let body = hgvs.join("\n");
        let response = self.client.put(&url).body(body).send()?.error_for_status()?;
        let registered: Vec<Value> = response.json()?;

        if registered.len() != hgvs.len() {
            return Err(ClientError::InvalidResponse(format!(
                "registry returned {} records for {} submissions",
                registered.len(),
                hgvs.len()
            )));
        }

        Ok(hgvs
            .iter()
            .zip(registered)
            .map(|(hgvs, record)| RegisteredAllele {
                hgvs: hgvs.clone(),
                clingen_allele_id: record
                    .get("@id")
                    .and_then(Value::as_str)
                    .and_then(|id| id.rsplit('/').next())
                    .filter(|id| id.starts_with("CA"))
                    .map(str::to_string),
            })
            .collect())
    }

    fn associated_clinvar_allele_id(&self, caid: &str) -> Result<Option<String>, ClientError> {
        let url = format!("{}/allele/{}", self.base_url, caid);
        let response = self.client.get(&url).send()?.error_for_status()?;
        let allele: Value = response.json()?;
        Ok(allele
            .get("externalRecords")
            .and_then(|r| r.get("ClinVarAlleles"))
            .and_then(Value::as_array)
            .and_then(|records| records.first())
            .and_then(|record| record.get("alleleId"))
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
    }
}

pub struct HttpLdhClient {
    base_url: String,
    client: reqwest::blocking::Client,
    username: Option<String>,
    password: Option<String>,
}

impl HttpLdhClient {
    pub fn new(
        base_url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            username,
            password,
        })
    }
}

impl LdhClient for HttpLdhClient {
    fn authenticate(&self) -> Result<(), ClientError> {
        let url = format!("{}/auth", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        request.send()?.error_for_status()?;
        Ok(())
    }

    fn dispatch_submissions(
        &self,
        submissions: &[LdhSubmission],
        batch_size: usize,
    ) -> Result<(usize, Vec<String>), ClientError> {
        let url = format!("{}/entities", self.base_url);
        let mut successes = 0usize;
        let mut failures = Vec::new();

        for batch in submissions.chunks(batch_size.max(1)) {
            let response = self.client.post(&url).json(batch).send()?;
            if response.status().is_success() {
                successes += batch.len();
            } else {
                failures.extend(batch.iter().map(|s| s.variant_urn.clone()));
            }
        }

        Ok((successes, failures))
    }

    fn clingen_variation(&self, variant_urn: &str) -> Result<Option<Value>, ClientError> {
        let url = format!("{}/Variant?mavedb={}", self.base_url, variant_urn);
        let response = self.client.get(&url).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = response.error_for_status()?.json()?;
        Ok(body.get("data").cloned().or(Some(body)))
    }
}

#[cfg(test)]
#[path = "clingen_tests.rs"]
mod tests;
