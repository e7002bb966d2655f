// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    network     = { ClientError::Network("refused".into()), FailureCategory::NetworkError },
    timeout     = { ClientError::Timeout("30s elapsed".into()), FailureCategory::Timeout },
    unavailable = { ClientError::ServiceUnavailable("503".into()), FailureCategory::ServiceUnavailable },
    bad_data    = { ClientError::Validation("bad column".into()), FailureCategory::ValidationError },
    invalid     = { ClientError::InvalidResponse("truncated".into()), FailureCategory::Unknown },
)]
fn classifies_client_errors(error: ClientError, expected: FailureCategory) {
    assert_eq!(classify_failure(&JobError::Client(error)), expected);
}

#[test]
fn classifies_validation_errors() {
    assert_eq!(
        classify_failure(&JobError::Validation("no target genes".into())),
        FailureCategory::ValidationError
    );
    assert_eq!(
        classify_failure(&JobError::MissingParams(vec!["score_set_id".into()])),
        FailureCategory::ValidationError
    );
}

#[test]
fn unclassified_errors_are_unknown() {
    assert_eq!(
        classify_failure(&JobError::Linking("too many failures".into())),
        FailureCategory::Unknown
    );
    assert_eq!(
        classify_failure(&JobError::Submission("ldh rejected".into())),
        FailureCategory::Unknown
    );
}

#[test]
fn kind_is_stable_snake_case() {
    assert_eq!(
        JobError::NonexistentMappingScores("x".into()).kind(),
        "nonexistent_mapping_scores"
    );
    assert_eq!(JobError::Validation("x".into()).kind(), "validation_error");
}
