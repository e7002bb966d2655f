// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration knobs, environment-sourced and read-only after
//! process start.

use std::path::PathBuf;

/// Configuration shared by the worker context.
#[derive(Debug, Clone)]
pub struct Config {
    /// Empty/unset disables LDH submission
    pub ldh_submission_endpoint: Option<String>,
    /// Empty/unset disables allele registry submission
    pub car_submission_endpoint: Option<String>,
    /// Global on/off for all ClinGen submission jobs
    pub clingen_submission_enabled: bool,
    /// Linkage failure ratio above which a retry is attempted, in [0, 1]
    pub linked_data_retry_threshold: f64,
    /// Maximum self-re-enqueue attempts for linkage backoff
    pub enqueue_backoff_attempt_limit: u32,
    /// Fixed backoff applied when chaining and retrying linkage jobs
    pub linking_backoff_in_seconds: u64,
    pub default_ldh_submission_batch_size: usize,
    /// Default retry budget stamped onto new job runs
    pub default_max_retries: u32,
    /// Bucket holding staged user uploads
    pub uploads_bucket: String,
    pub blocking_pool_size: usize,
    pub poll_interval_ms: u64,
    /// Commit journal location; unset runs without durability
    pub journal_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ldh_submission_endpoint: None,
            car_submission_endpoint: None,
            clingen_submission_enabled: true,
            linked_data_retry_threshold: 0.5,
            enqueue_backoff_attempt_limit: 3,
            linking_backoff_in_seconds: 300,
            default_ldh_submission_batch_size: 50,
            default_max_retries: 3,
            uploads_bucket: "mavejobs-uploads".to_string(),
            blocking_pool_size: 4,
            poll_interval_ms: 500,
            journal_path: None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or(default),
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ldh_submission_endpoint: env_string("LDH_SUBMISSION_ENDPOINT"),
            car_submission_endpoint: env_string("CAR_SUBMISSION_ENDPOINT"),
            clingen_submission_enabled: env_parse(
                "CLIN_GEN_SUBMISSION_ENABLED",
                defaults.clingen_submission_enabled,
            ),
            linked_data_retry_threshold: env_parse(
                "LINKED_DATA_RETRY_THRESHOLD",
                defaults.linked_data_retry_threshold,
            )
            .clamp(0.0, 1.0),
            enqueue_backoff_attempt_limit: env_parse(
                "ENQUEUE_BACKOFF_ATTEMPT_LIMIT",
                defaults.enqueue_backoff_attempt_limit,
            )
            .max(1),
            linking_backoff_in_seconds: env_parse(
                "LINKING_BACKOFF_IN_SECONDS",
                defaults.linking_backoff_in_seconds,
            ),
            default_ldh_submission_batch_size: env_parse(
                "DEFAULT_LDH_SUBMISSION_BATCH_SIZE",
                defaults.default_ldh_submission_batch_size,
            )
            .max(1),
            default_max_retries: env_parse("DEFAULT_MAX_RETRIES", defaults.default_max_retries),
            uploads_bucket: env_string("UPLOADS_BUCKET").unwrap_or(defaults.uploads_bucket),
            blocking_pool_size: env_parse("BLOCKING_POOL_SIZE", defaults.blocking_pool_size),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", defaults.poll_interval_ms),
            journal_path: env_string("JOURNAL_PATH").map(PathBuf::from),
        }
    }

    /// Whether allele-registry submission is enabled and has an endpoint.
    pub fn car_submission_active(&self) -> bool {
        self.clingen_submission_enabled && self.car_submission_endpoint.is_some()
    }

    /// Whether LDH submission is enabled and has an endpoint.
    pub fn ldh_submission_active(&self) -> bool {
        self.clingen_submission_enabled && self.ldh_submission_endpoint.is_some()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
