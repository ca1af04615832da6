pub mod annotation;
pub mod gene_set;
pub mod identity;
pub mod report;
pub mod sample;
pub mod scope;
pub mod snapshot;
pub mod tier;

// re-export for cleaner imports
pub use self::annotation::{AnnotationKind, AnnotationPayload, AnnotationRecord, NewAnnotation};
pub use self::gene_set::EffectiveGeneSet;
pub use self::identity::{
    GenomicLocus, IdentityKey, IdentityLevel, RawObservation, Representation, VariantIdentity,
};
pub use self::report::ReportArtifact;
pub use self::sample::{GenelistSelection, ReportEntry, Sample, SampleComment, SampleStatus};
pub use self::scope::{AssayFamily, RecordScope, Scope, ScopeFilter};
pub use self::snapshot::ReportedVariantSnapshot;
pub use self::tier::Tier;
