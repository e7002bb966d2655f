// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Score-data standardization boundary.
//!
//! CSV parsing, HGVS validation, and dataframe standardization are external
//! collaborators; the worker only sees this trait. The bundled
//! [`JsonScoreDataParser`] accepts pre-standardized JSON rows, which is what
//! the upstream validation service stages for the worker.

use super::ClientError;
use mj_core::VariantInput;
use serde_json::Value;

/// Validation and standardization of uploaded score/count files
pub trait ScoreDataParser: Send + Sync {
    /// Validate the user-provided column metadata before touching file data.
    fn validate_column_metadata(
        &self,
        score_columns: &Value,
        count_columns: Option<&Value>,
    ) -> Result<(), ClientError>;

    /// Standardize the uploaded files into one row per variant.
    fn standardize(
        &self,
        scores: &[u8],
        counts: Option<&[u8]>,
        score_columns: &Value,
        count_columns: Option<&Value>,
    ) -> Result<Vec<VariantInput>, ClientError>;
}

/// Parser for pre-standardized uploads: a JSON array of row objects.
#[derive(Default)]
pub struct JsonScoreDataParser;

impl JsonScoreDataParser {
    fn rows(bytes: &[u8]) -> Result<Vec<Value>, ClientError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ClientError::Validation(format!("scores file is not valid JSON: {e}")))?;
        match value {
            Value::Array(rows) => Ok(rows),
            _ => Err(ClientError::Validation(
                "scores file must be a JSON array of rows".to_string(),
            )),
        }
    }
}

impl ScoreDataParser for JsonScoreDataParser {
    fn validate_column_metadata(
        &self,
        score_columns: &Value,
        count_columns: Option<&Value>,
    ) -> Result<(), ClientError> {
        if !score_columns.is_object() && !score_columns.is_array() {
            return Err(ClientError::Validation(
                "score column metadata must be an object or array".to_string(),
            ));
        }
        if let Some(count_columns) = count_columns {
            if !count_columns.is_object() && !count_columns.is_array() {
                return Err(ClientError::Validation(
                    "count column metadata must be an object or array".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn standardize(
        &self,
        scores: &[u8],
        counts: Option<&[u8]>,
        _score_columns: &Value,
        _count_columns: Option<&Value>,
    ) -> Result<Vec<VariantInput>, ClientError> {
        let score_rows = Self::rows(scores)?;
        let count_rows = match counts {
            Some(counts) => Some(Self::rows(counts)?),
            None => None,
        };

        if let Some(count_rows) = &count_rows {
            if count_rows.len() != score_rows.len() {
                return Err(ClientError::Validation(format!(
                    "scores and counts row mismatch: {} vs {}",
                    score_rows.len(),
                    count_rows.len()
                )));
            }
        }

        Ok(score_rows
            .into_iter()
            .enumerate()
            .map(|(i, score_row)| {
                let mut data = serde_json::Map::new();
                data.insert("score_data".to_string(), score_row);
                if let Some(count_rows) = &count_rows {
                    data.insert("count_data".to_string(), count_rows[i].clone());
                }
                VariantInput {
                    data: Value::Object(data),
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "scores_tests.rs"]
mod tests;
