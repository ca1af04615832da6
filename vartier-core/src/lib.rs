//! # vartier-core
//!
//! Shared data models for variant tier resolution and clinical report
//! generation: variant identities and their normalization, annotation
//! records and scopes, the sample aggregate, report artifacts and the
//! immutable reported-variant snapshots.
//!
//! The crates building on this one:
//! - `vartier-annot` - annotation store interface, resolution, mutation
//! - `vartier-report` - gene-set scoping, report sequencing and the
//!   persistence pipeline

pub mod errors;
pub mod models;
pub mod normalize;

pub use errors::{IdentityError, StoreError};
pub use models::{
    AnnotationKind, AnnotationPayload, AnnotationRecord, AssayFamily, EffectiveGeneSet,
    GenelistSelection, GenomicLocus, IdentityKey, IdentityLevel, NewAnnotation, RawObservation,
    RecordScope, ReportArtifact, ReportEntry, ReportedVariantSnapshot, Representation, Sample,
    SampleComment, SampleStatus, Scope, ScopeFilter, Tier, VariantIdentity,
};
