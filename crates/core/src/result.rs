// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tagged job results stored under a job run's `metadata.result`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured error details suitable for operator-facing logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDetails {
    /// Error class, e.g. "linking_error"
    pub kind: String,
    pub message: String,
}

impl ExceptionDetails {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Outcome a job function hands back to the dispatch decorator.
///
/// The decorator pattern-matches on the tag to choose the terminal job
/// transition and stores the whole value verbatim under `metadata.result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    Ok {
        data: Value,
    },
    Error {
        data: Value,
        exception: Option<ExceptionDetails>,
    },
    Failed {
        data: Value,
        exception: Option<ExceptionDetails>,
    },
    Skipped {
        data: Value,
    },
}

impl JobResult {
    pub fn ok(data: Value) -> Self {
        JobResult::Ok { data }
    }

    pub fn empty() -> Self {
        JobResult::Ok {
            data: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn failed(data: Value, exception: ExceptionDetails) -> Self {
        JobResult::Failed {
            data,
            exception: Some(exception),
        }
    }

    pub fn skipped(data: Value) -> Self {
        JobResult::Skipped { data }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, JobResult::Ok { .. })
    }

    pub fn data(&self) -> &Value {
        match self {
            JobResult::Ok { data }
            | JobResult::Error { data, .. }
            | JobResult::Failed { data, .. }
            | JobResult::Skipped { data } => data,
        }
    }

    pub fn exception(&self) -> Option<&ExceptionDetails> {
        match self {
            JobResult::Error { exception, .. } | JobResult::Failed { exception, .. } => {
                exception.as_ref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
