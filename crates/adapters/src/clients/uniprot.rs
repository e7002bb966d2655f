// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UniProt ID-mapping client.
//!
//! UniProt mappings are asynchronous server-side: submission returns a job
//! id, results are polled separately.

use super::ClientError;
use serde_json::Value;
use std::time::Duration;

/// Blocking client for the UniProt ID-mapping API
pub trait UniprotClient: Send + Sync {
    /// Submit a mapping job; returns the remote job id.
    fn submit_id_mapping(
        &self,
        from_db: &str,
        to_db: &str,
        accessions: &[String],
    ) -> Result<String, ClientError>;

    fn results_ready(&self, job_id: &str) -> Result<bool, ClientError>;

    fn mapping_results(&self, job_id: &str) -> Result<Value, ClientError>;
}

/// Extract `(from accession, uniprot id)` pairs from a results document.
pub fn extract_uniprot_ids(results: &Value) -> Vec<(String, String)> {
    results
        .get("results")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let from = entry.get("from").and_then(Value::as_str)?;
                    let to = entry.get("to").and_then(|to| match to {
                        Value::String(s) => Some(s.as_str()),
                        other => other.get("primaryAccession").and_then(Value::as_str),
                    })?;
                    Some((from.to_string(), to.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Guess the UniProt source database from a sequence accession prefix.
pub fn infer_db_name_from_accession(accession: &str) -> &'static str {
    if accession.starts_with("NP_") || accession.starts_with("XP_") {
        "RefSeq_Protein"
    } else if accession.starts_with("NM_") || accession.starts_with("XM_") {
        "RefSeq_Nucleotide"
    } else if accession.starts_with("ENSP") {
        "Ensembl_Protein"
    } else if accession.starts_with("ENST") {
        "Ensembl_Transcript"
    } else {
        "RefSeq_Protein"
    }
}

pub struct HttpUniprotClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpUniprotClient {
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

impl UniprotClient for HttpUniprotClient {
    fn submit_id_mapping(
        &self,
        from_db: &str,
        to_db: &str,
        accessions: &[String],
    ) -> Result<String, ClientError> {
        let url = format!("{}/idmapping/run", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("from", from_db),
                ("to", to_db),
                ("ids", &accessions.join(",")),
            ])
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;
        body.get("jobId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse("missing jobId".to_string()))
    }

    fn results_ready(&self, job_id: &str) -> Result<bool, ClientError> {
        let url = format!("{}/idmapping/status/{}", self.base_url, job_id);
        let response = self.client.get(&url).send()?.error_for_status()?;
        let body: Value = response.json()?;
        Ok(body.get("jobStatus").and_then(Value::as_str) == Some("FINISHED")
            || body.get("results").is_some())
    }

    fn mapping_results(&self, job_id: &str) -> Result<Value, ClientError> {
        let url = format!("{}/idmapping/results/{}", self.base_url, job_id);
        let response = self.client.get(&url).send()?.error_for_status()?;
        Ok(response.json()?)
    }
}

#[cfg(test)]
#[path = "uniprot_tests.rs"]
mod tests;
