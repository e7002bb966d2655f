// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mj-core: Domain model for the MaveJobs worker runtime
//!
//! Ids, clocks, status machines, and the persisted record shapes shared by
//! the persistence gateway, the managers, and the job functions.

pub mod clock;
pub mod dependency;
pub mod domain;
pub mod id;
pub mod job_run;
pub mod pipeline;
pub mod result;
pub mod status;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dependency::{dependency_is_met, unreachable_reason, DependencyType, JobDependency};
pub use domain::{
    AnnotationLayer, AnnotationRecord, AnnotationStatus, AnnotationType, ClinicalControl,
    MappedVariant, MappingState, ProcessingState, ScoreSet, TargetGene, Variant, VariantInput,
};
pub use id::{
    AnnotationId, ControlId, IdGen, JobId, MappedVariantId, PipelineId, ScoreSetId,
    SequentialIdGen, TargetGeneId, UuidIdGen, VariantId,
};
pub use job_run::{JobRun, JobRunConfig, RetryHistoryEntry};
pub use pipeline::Pipeline;
pub use result::{ExceptionDetails, JobResult};
pub use status::{
    FailureCategory, JobStatus, PipelineStatus, ACTIVE_JOB_STATUSES, CANCELLED_JOB_STATUSES,
    CANCELLED_PIPELINE_STATUSES, RETRYABLE_FAILURE_CATEGORIES, RETRYABLE_JOB_STATUSES,
    STARTABLE_JOB_STATUSES, STARTABLE_PIPELINE_STATUSES, TERMINAL_JOB_STATUSES,
    TERMINAL_PIPELINE_STATUSES,
};
