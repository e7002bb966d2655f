// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for managers and job functions.

use mj_adapters::{ClientError, QueueError};
use mj_core::FailureCategory;
use mj_storage::StoreError;
use thiserror::Error;

/// Errors raised by the job and pipeline managers
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Operation called against the wrong status; a programming error,
    /// never retried
    #[error("invalid transition: {0}")]
    Transition(String),
    /// A mutation failed its post-condition checks at flush
    #[error("state persistence failed: {0}")]
    StatePersistence(String),
    /// Read or write failed at the store
    #[error("database error: {0}")]
    DatabaseConnection(#[from] StoreError),
    /// Pipeline operation failed unrecoverably
    #[error("pipeline coordination failed: {0}")]
    Coordination(String),
    /// Queue rejected an enqueue; the job stays PENDING for the next
    /// coordination pass
    #[error("enqueue failed: {0}")]
    Enqueue(#[from] QueueError),
}

/// Errors raised by job functions
#[derive(Debug, Error)]
pub enum JobError {
    #[error("missing required job params: {0:?}")]
    MissingParams(Vec<String>),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("submission error: {0}")]
    Submission(String),
    #[error("linking error: {0}")]
    Linking(String),
    #[error("mapping service returned no results: {0}")]
    NonexistentMappingResults(String),
    #[error("mapping service returned no mapped scores: {0}")]
    NonexistentMappingScores(String),
    #[error("mapping service returned no reference metadata: {0}")]
    NonexistentMappingReference(String),
    #[error("no UniProt mapping result found: {0}")]
    UniprotMappingResultNotFound(String),
    #[error("ambiguous UniProt mapping result: {0}")]
    UniprotAmbiguousMappingResult(String),
    #[error("target gene does not exist: {0}")]
    NonexistentTargetGene(String),
    #[error("unknown job function: {0}")]
    UnknownFunction(String),
    #[error("enqueue rejected: {0}")]
    Enqueue(String),
    #[error("blocking pool failure: {0}")]
    Pool(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Manager(#[from] ManagerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JobError {
    /// Stable error class name recorded in job results and logs
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::MissingParams(_) => "missing_params",
            JobError::Validation(_) => "validation_error",
            JobError::Submission(_) => "submission_error",
            JobError::Linking(_) => "linking_error",
            JobError::NonexistentMappingResults(_) => "nonexistent_mapping_results",
            JobError::NonexistentMappingScores(_) => "nonexistent_mapping_scores",
            JobError::NonexistentMappingReference(_) => "nonexistent_mapping_reference",
            JobError::UniprotMappingResultNotFound(_) => "uniprot_mapping_result_not_found",
            JobError::UniprotAmbiguousMappingResult(_) => "uniprot_ambiguous_mapping_result",
            JobError::NonexistentTargetGene(_) => "nonexistent_target_gene",
            JobError::UnknownFunction(_) => "unknown_function",
            JobError::Enqueue(_) => "enqueue_error",
            JobError::Pool(_) => "pool_error",
            JobError::Client(_) => "client_error",
            JobError::Manager(_) => "manager_error",
            JobError::Store(_) => "store_error",
        }
    }
}

/// Map an error onto the failure category recorded on the job run.
///
/// Transient transport failures land in the retryable categories;
/// everything without a clear classification stays UNKNOWN.
pub fn classify_failure(error: &JobError) -> FailureCategory {
    match error {
        JobError::Client(ClientError::Network(_)) => FailureCategory::NetworkError,
        JobError::Client(ClientError::Timeout(_)) => FailureCategory::Timeout,
        JobError::Client(ClientError::ServiceUnavailable(_)) => {
            FailureCategory::ServiceUnavailable
        }
        JobError::Client(ClientError::Validation(_))
        | JobError::Validation(_)
        | JobError::MissingParams(_) => FailureCategory::ValidationError,
        _ => FailureCategory::Unknown,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
