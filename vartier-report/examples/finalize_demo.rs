//! Minimal finalize walkthrough over in-memory stores: classify a
//! variant, finalize a report into a temp directory, then show that the
//! snapshot keeps the report-time tier after the live one changes.
//!
//! Run with: cargo run --example finalize_demo

use std::collections::BTreeSet;

use anyhow::Result;
use vartier_annot::{AnnotationResolver, ClassificationMutator, MemoryAnnotationStore};
use vartier_core::models::{GenomicLocus, Sample, Scope, Tier, VariantIdentity};
use vartier_report::{
    FinalizeRequest, FsArtifactStore, MemoryIsglStore, MemorySampleStore, MemorySnapshotStore,
    ReportPipeline, ReportVariant, SnapshotStore,
};

fn main() -> Result<()> {
    let annotations = MemoryAnnotationStore::new();
    let samples = MemorySampleStore::new();
    let isgls = MemoryIsglStore::new();
    let snapshots = MemorySnapshotStore::new();

    let dir = tempfile::tempdir()?;
    let artifacts = FsArtifactStore::new(dir.path())?;

    samples.insert(Sample::new("25MD08436", "myeloid_GMSv1"));
    let scope = Scope::assay_wide("myeloid_GMSv1");

    let braf = VariantIdentity::from_parts(
        Some("p.V600E"),
        Some("NM_004333.4:c.1799T>A"),
        Some(GenomicLocus::new("chr7", 140453136, "A", "T")),
    )?;

    let mutator = ClassificationMutator::new(&annotations);
    mutator.apply(&braf, &scope, Tier::I, "kp")?;

    let pipeline = ReportPipeline::new(&annotations, &samples, &isgls, &artifacts, &snapshots);
    let outcome = pipeline.finalize_report(FinalizeRequest {
        sample_id: "25MD08436".to_string(),
        variants: vec![ReportVariant {
            identity: braf.clone(),
            gene: "BRAF".to_string(),
            transcript: Some("NM_004333".to_string()),
        }],
        baseline_genes: BTreeSet::from(["BRAF".to_string()]),
        body: b"<html>rendered by the report layer</html>".to_vec(),
        filename: "25MD08436_CL123-NA_CL124.20260806.html".to_string(),
        author: "kp".to_string(),
        resume: None,
    })?;
    println!(
        "finalized {} ({} snapshot rows) at {}",
        outcome.artifact.report_id, outcome.snapshot_rows, outcome.artifact.filepath
    );

    // Re-classify after the report went out.
    mutator.apply(&braf, &scope, Tier::III, "ms")?;
    let live = AnnotationResolver::new(&annotations).resolve_tier(&braf, &scope)?;
    let reported = snapshots.history("25MD08436")?[0].tier;
    println!("live tier is now {:?}, report kept {:?}", live, reported);

    Ok(())
}
