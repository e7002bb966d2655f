// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External service client interfaces.
//!
//! Each third party is a narrow blocking trait; callers offload invocations
//! to the worker's blocking pool. Errors carry enough shape for the engine
//! to classify failures into retryable categories.

pub mod clingen;
pub mod clinvar;
pub mod gnomad;
pub mod objects;
pub mod scores;
pub mod uniprot;
pub mod vrs;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use thiserror::Error;

/// Errors from external service calls
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e
            .status()
            .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        {
            ClientError::ServiceUnavailable(e.to_string())
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
