use thiserror::Error;

use vartier_core::errors::{IdentityError, StoreError};

/// Failures of report finalization and number allocation.
///
/// `AllocationFailed` means retries are exhausted; the attempt failed
/// closed without leaking a number, so the caller may retry the whole
/// finalize later. `PartialPersist` carries the report id of an attempt
/// that wrote its artifact but not all of its bookkeeping; resuming with
/// that id completes the remaining idempotent steps.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("sample not found: {0}")]
    SampleNotFound(String),

    #[error("report number allocation for sample {sample_id} failed after {attempts} attempts")]
    AllocationFailed { sample_id: String, attempts: u32 },

    #[error("artifact at {path} already exists with different content")]
    ArtifactMismatch { path: String },

    #[error("report {report_id} persisted partially: {source}")]
    PartialPersist {
        report_id: String,
        #[source]
        source: StoreError,
    },

    #[error("malformed resume id {0:?}")]
    BadResumeId(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
