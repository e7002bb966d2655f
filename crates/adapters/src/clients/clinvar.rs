// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ClinVar variant-summary client and TSV parsing.

use super::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One parsed variant-summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinvarRecord {
    pub allele_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
}

/// Blocking client fetching monthly variant-summary snapshots
pub trait ClinvarClient: Send + Sync {
    fn variant_summary_tsv(&self, month: u32, year: i32) -> Result<Vec<u8>, ClientError>;
}

/// ClinVar publishes monthly archives from 2015 onward.
pub fn validate_variant_summary_date(month: u32, year: i32) -> Result<(), ClientError> {
    if !(1..=12).contains(&month) {
        return Err(ClientError::Validation(format!("invalid month: {month}")));
    }
    if year < 2015 {
        return Err(ClientError::Validation(format!(
            "no ClinVar variant summary archives exist before 2015 (got {year})"
        )));
    }
    Ok(())
}

/// Parse a variant-summary TSV into records keyed by allele id.
///
/// Only the columns the worker consumes are retained; rows without an
/// `#AlleleID` value are dropped.
pub fn parse_variant_summary(tsv: &[u8]) -> Result<HashMap<String, ClinvarRecord>, ClientError> {
    let text = std::str::from_utf8(tsv)
        .map_err(|e| ClientError::InvalidResponse(format!("variant summary is not UTF-8: {e}")))?;
    let mut lines = text.lines();

    let header = lines
        .next()
        .ok_or_else(|| ClientError::InvalidResponse("empty variant summary".to_string()))?;
    let columns: Vec<&str> = header.trim_start_matches('#').split('\t').collect();
    let index_of = |name: &str| columns.iter().position(|c| *c == name);

    let allele_idx = index_of("AlleleID").ok_or_else(|| {
        ClientError::InvalidResponse("variant summary missing AlleleID column".to_string())
    })?;
    let gene_idx = index_of("GeneSymbol");
    let significance_idx = index_of("ClinicalSignificance");
    let review_idx = index_of("ReviewStatus");

    let field = |fields: &[&str], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| fields.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "-")
            .map(str::to_string)
    };

    let mut records = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let Some(allele_id) = field(&fields, Some(allele_idx)) else {
            continue;
        };
        records.insert(
            allele_id.clone(),
            ClinvarRecord {
                allele_id,
                gene_symbol: field(&fields, gene_idx),
                clinical_significance: field(&fields, significance_idx),
                review_status: field(&fields, review_idx),
            },
        );
    }

    Ok(records)
}

pub struct HttpClinvarClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpClinvarClient {
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

impl ClinvarClient for HttpClinvarClient {
    fn variant_summary_tsv(&self, month: u32, year: i32) -> Result<Vec<u8>, ClientError> {
        validate_variant_summary_date(month, year)?;
        let url = format!(
            "{}/variant_summary_{:04}-{:02}.txt",
            self.base_url, year, month
        );
        let response = self.client.get(&url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
#[path = "clinvar_tests.rs"]
mod tests;
