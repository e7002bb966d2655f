// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fake clients for tests.
//!
//! Each fake records the calls it receives and returns responses scripted
//! by the test. Error scripting uses plain strings surfaced as network
//! errors; richer failure shapes are injected per fake where a job branches
//! on them.

use super::clingen::{AlleleRegistry, LdhClient, LdhSubmission, RegisteredAllele};
use super::clinvar::ClinvarClient;
use super::gnomad::{GnomadClient, GnomadRecord};
use super::objects::ObjectStore;
use super::scores::ScoreDataParser;
use super::uniprot::UniprotClient;
use super::vrs::{MappingResponse, VariantMapper};
use super::ClientError;
use mj_core::VariantInput;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

fn scripted_err(message: &str) -> ClientError {
    ClientError::Network(message.to_string())
}

/// Fake VRS mapper returning one scripted response
#[derive(Default)]
pub struct FakeVariantMapper {
    response: Mutex<Option<MappingResponse>>,
    error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeVariantMapper {
    pub fn respond_with(&self, response: MappingResponse) {
        *self.response.lock() = Some(response);
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock() = Some(message.to_string());
    }
}

impl VariantMapper for FakeVariantMapper {
    fn map_score_set(&self, score_set_urn: &str) -> Result<MappingResponse, ClientError> {
        self.calls.lock().push(score_set_urn.to_string());
        if let Some(message) = self.error.lock().as_ref() {
            return Err(scripted_err(message));
        }
        Ok(self.response.lock().clone().unwrap_or_default())
    }
}

/// Fake allele registry mapping scripted HGVS strings to CAIDs
#[derive(Default)]
pub struct FakeAlleleRegistry {
    caids_by_hgvs: Mutex<HashMap<String, String>>,
    clinvar_ids_by_caid: Mutex<HashMap<String, String>>,
    error: Mutex<Option<String>>,
    pub submissions: Mutex<Vec<Vec<String>>>,
    pub clinvar_lookups: Mutex<Vec<String>>,
}

impl FakeAlleleRegistry {
    pub fn register(&self, hgvs: &str, caid: &str) {
        self.caids_by_hgvs
            .lock()
            .insert(hgvs.to_string(), caid.to_string());
    }

    pub fn associate_clinvar(&self, caid: &str, clinvar_allele_id: &str) {
        self.clinvar_ids_by_caid
            .lock()
            .insert(caid.to_string(), clinvar_allele_id.to_string());
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock() = Some(message.to_string());
    }
}

impl AlleleRegistry for FakeAlleleRegistry {
    fn dispatch_submissions(&self, hgvs: &[String]) -> Result<Vec<RegisteredAllele>, ClientError> {
        self.submissions.lock().push(hgvs.to_vec());
        if let Some(message) = self.error.lock().as_ref() {
            return Err(scripted_err(message));
        }
        let caids = self.caids_by_hgvs.lock();
        Ok(hgvs
            .iter()
            .map(|h| RegisteredAllele {
                hgvs: h.clone(),
                clingen_allele_id: caids.get(h).cloned(),
            })
            .collect())
    }

    fn associated_clinvar_allele_id(&self, caid: &str) -> Result<Option<String>, ClientError> {
        self.clinvar_lookups.lock().push(caid.to_string());
        if let Some(message) = self.error.lock().as_ref() {
            return Err(scripted_err(message));
        }
        Ok(self.clinvar_ids_by_caid.lock().get(caid).cloned())
    }
}

/// Fake LDH client with scripted per-urn failures and variations
#[derive(Default)]
pub struct FakeLdhClient {
    failing_urns: Mutex<HashSet<String>>,
    variations: Mutex<HashMap<String, Value>>,
    auth_error: Mutex<Option<String>>,
    pub authenticated: AtomicBool,
    pub dispatched: Mutex<Vec<LdhSubmission>>,
    pub variation_lookups: Mutex<Vec<String>>,
}

impl FakeLdhClient {
    pub fn fail_submission_for(&self, variant_urn: &str) {
        self.failing_urns.lock().insert(variant_urn.to_string());
    }

    pub fn set_variation(&self, variant_urn: &str, variation: Value) {
        self.variations
            .lock()
            .insert(variant_urn.to_string(), variation);
    }

    pub fn fail_authentication(&self, message: &str) {
        *self.auth_error.lock() = Some(message.to_string());
    }
}

impl LdhClient for FakeLdhClient {
    fn authenticate(&self) -> Result<(), ClientError> {
        if let Some(message) = self.auth_error.lock().as_ref() {
            return Err(scripted_err(message));
        }
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn dispatch_submissions(
        &self,
        submissions: &[LdhSubmission],
        _batch_size: usize,
    ) -> Result<(usize, Vec<String>), ClientError> {
        self.dispatched.lock().extend(submissions.iter().cloned());
        let failing = self.failing_urns.lock();
        let failures: Vec<String> = submissions
            .iter()
            .filter(|s| failing.contains(&s.variant_urn))
            .map(|s| s.variant_urn.clone())
            .collect();
        Ok((submissions.len() - failures.len(), failures))
    }

    fn clingen_variation(&self, variant_urn: &str) -> Result<Option<Value>, ClientError> {
        self.variation_lookups.lock().push(variant_urn.to_string());
        Ok(self.variations.lock().get(variant_urn).cloned())
    }
}

/// Fake gnomAD client returning scripted records
#[derive(Default)]
pub struct FakeGnomadClient {
    records: Mutex<Vec<GnomadRecord>>,
    pub queries: Mutex<Vec<Vec<String>>>,
}

impl FakeGnomadClient {
    pub fn add_record(&self, record: GnomadRecord) {
        self.records.lock().push(record);
    }
}

impl GnomadClient for FakeGnomadClient {
    fn data_for_caids(&self, caids: &[String]) -> Result<Vec<GnomadRecord>, ClientError> {
        self.queries.lock().push(caids.to_vec());
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| caids.contains(&r.caid))
            .cloned()
            .collect())
    }
}

/// Fake UniProt client with per-job readiness scripting
#[derive(Default)]
pub struct FakeUniprotClient {
    next_job: AtomicU64,
    ready: Mutex<HashSet<String>>,
    results: Mutex<HashMap<String, Value>>,
    pub submissions: Mutex<Vec<(String, String, Vec<String>)>>,
}

impl FakeUniprotClient {
    pub fn mark_ready(&self, job_id: &str, results: Value) {
        self.ready.lock().insert(job_id.to_string());
        self.results.lock().insert(job_id.to_string(), results);
    }
}

impl UniprotClient for FakeUniprotClient {
    fn submit_id_mapping(
        &self,
        from_db: &str,
        to_db: &str,
        accessions: &[String],
    ) -> Result<String, ClientError> {
        self.submissions.lock().push((
            from_db.to_string(),
            to_db.to_string(),
            accessions.to_vec(),
        ));
        let n = self.next_job.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("uniprot-job-{n}"))
    }

    fn results_ready(&self, job_id: &str) -> Result<bool, ClientError> {
        Ok(self.ready.lock().contains(job_id))
    }

    fn mapping_results(&self, job_id: &str) -> Result<Value, ClientError> {
        self.results
            .lock()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(job_id.to_string()))
    }
}

/// Fake ClinVar client serving one scripted TSV snapshot
#[derive(Default)]
pub struct FakeClinvarClient {
    tsv: Mutex<Vec<u8>>,
    pub fetches: Mutex<Vec<(u32, i32)>>,
}

impl FakeClinvarClient {
    pub fn set_summary(&self, tsv: &str) {
        *self.tsv.lock() = tsv.as_bytes().to_vec();
    }
}

impl ClinvarClient for FakeClinvarClient {
    fn variant_summary_tsv(&self, month: u32, year: i32) -> Result<Vec<u8>, ClientError> {
        self.fetches.lock().push((month, year));
        Ok(self.tsv.lock().clone())
    }
}

/// Fake object store with in-memory buckets
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl FakeObjectStore {
    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
    }
}

impl ObjectStore for FakeObjectStore {
    fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{bucket}/{key}")))
    }
}

/// Fake score-data parser returning scripted standardized rows
#[derive(Default)]
pub struct FakeScoreDataParser {
    rows: Mutex<Vec<VariantInput>>,
    metadata_error: Mutex<Option<String>>,
    data_error: Mutex<Option<String>>,
}

impl FakeScoreDataParser {
    pub fn produce(&self, rows: Vec<VariantInput>) {
        *self.rows.lock() = rows;
    }

    pub fn reject_metadata(&self, message: &str) {
        *self.metadata_error.lock() = Some(message.to_string());
    }

    pub fn reject_data(&self, message: &str) {
        *self.data_error.lock() = Some(message.to_string());
    }
}

impl ScoreDataParser for FakeScoreDataParser {
    fn validate_column_metadata(
        &self,
        _score_columns: &Value,
        _count_columns: Option<&Value>,
    ) -> Result<(), ClientError> {
        if let Some(message) = self.metadata_error.lock().as_ref() {
            return Err(ClientError::Validation(message.clone()));
        }
        Ok(())
    }

    fn standardize(
        &self,
        _scores: &[u8],
        _counts: Option<&[u8]>,
        _score_columns: &Value,
        _count_columns: Option<&Value>,
    ) -> Result<Vec<VariantInput>, ClientError> {
        if let Some(message) = self.data_error.lock().as_ref() {
            return Err(ClientError::Validation(message.clone()));
        }
        Ok(self.rows.lock().clone())
    }
}
