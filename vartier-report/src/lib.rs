//! # vartier-report
//!
//! Report generation for classified variants: effective gene-set
//! scoping, atomic report-number sequencing, write-once artifact storage,
//! immutable per-variant snapshots and the finalize pipeline tying them
//! together.
//!
//! The pipeline's correctness anchor is the sample store's atomic
//! report-number allocation; everything downstream of allocation is
//! idempotent and replayable keyed by the report id.

pub mod artifact;
pub mod errors;
pub mod geneset;
pub mod pipeline;
pub mod sequencer;
pub mod snapshot;
pub mod store;

pub use artifact::{ArtifactStore, FsArtifactStore, MemoryArtifactStore, WriteOnceOutcome};
pub use errors::ReportError;
pub use geneset::{
    IsglStore, MemoryIsglStore, effective_gene_set, effective_genes_for_sample, resolve_selection,
};
pub use pipeline::{FinalizeOutcome, FinalizeRequest, ReportPipeline, ReportVariant};
pub use sequencer::{ReportSequencer, RetryPolicy};
pub use snapshot::{MemorySnapshotStore, SnapshotStore, SnapshotWriter};
pub use store::{FlakySampleStore, MemorySampleStore, SampleStore};
