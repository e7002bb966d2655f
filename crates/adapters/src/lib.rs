// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mj-adapters: Queue gateway and external service clients
//!
//! The work queue and every third-party service the job functions talk to
//! sit behind narrow traits here, with blocking reqwest implementations
//! for production and scripted fakes for tests.

pub mod clients;
pub mod queue;

pub use clients::clingen::{
    clingen_allele_id_from_variation, AlleleRegistry, HttpAlleleRegistry, HttpLdhClient,
    LdhClient, LdhSubmission, RegisteredAllele,
};
pub use clients::clinvar::{
    parse_variant_summary, validate_variant_summary_date, ClinvarClient, ClinvarRecord,
    HttpClinvarClient,
};
pub use clients::gnomad::{GnomadClient, GnomadRecord, HttpGnomadClient};
pub use clients::objects::{LocalObjectStore, ObjectStore};
pub use clients::scores::{JsonScoreDataParser, ScoreDataParser};
pub use clients::uniprot::{
    extract_uniprot_ids, infer_db_name_from_accession, HttpUniprotClient, UniprotClient,
};
pub use clients::vrs::{
    HttpVariantMapper, MappedScore, MappingResponse, ReferenceMetadata, VariantMapper,
};
pub use clients::ClientError;
pub use queue::{JobQueue, MemoryQueue, QueueEntry, QueueError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use clients::fake::{
    FakeAlleleRegistry, FakeClinvarClient, FakeGnomadClient, FakeLdhClient, FakeObjectStore,
    FakeScoreDataParser, FakeUniprotClient, FakeVariantMapper,
};
