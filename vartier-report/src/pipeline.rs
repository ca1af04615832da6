//! Report finalization.
//!
//! Orchestrates, in strict order: gene-set scoping and tier resolution,
//! report number allocation, artifact write, sample bookkeeping and
//! snapshot rows. There is no cross-store transaction to lean on; the
//! sequencer's uniqueness guarantee anchors correctness and every step
//! after allocation is idempotent and replayable keyed by the report id,
//! so a crashed attempt is resumed, never duplicated.

use std::collections::BTreeSet;

use chrono::Utc;

use vartier_annot::resolver::{AnnotationResolver, Resolution};
use vartier_annot::store::AnnotationStore;
use vartier_core::models::{ReportArtifact, ReportEntry, ReportedVariantSnapshot, VariantIdentity};

use crate::artifact::{ArtifactStore, WriteOnceOutcome, sha256_hex};
use crate::errors::ReportError;
use crate::geneset::{IsglStore, effective_gene_set, resolve_selection};
use crate::sequencer::{ReportSequencer, RetryPolicy};
use crate::snapshot::{SnapshotStore, SnapshotWriter};
use crate::store::SampleStore;

/// A variant the caller wants on the report, with its display fields.
#[derive(Debug, Clone)]
pub struct ReportVariant {
    pub identity: VariantIdentity,
    pub gene: String,
    pub transcript: Option<String>,
}

/// Everything a finalize call needs. The rendered body and the file name
/// follow the product's existing conventions and are supplied by the
/// caller; the core neither renders nor names reports.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub sample_id: String,
    pub variants: Vec<ReportVariant>,
    /// Baseline panel genes for the sample's assay.
    pub baseline_genes: BTreeSet<String>,
    pub body: Vec<u8>,
    pub filename: String,
    pub author: String,
    /// Report id of a previous partially-persisted attempt. When set, no
    /// new number is allocated; the remaining steps replay idempotently.
    pub resume: Option<String>,
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    pub artifact: ReportArtifact,
    /// Snapshot rows newly written by this call.
    pub snapshot_rows: usize,
    pub resumed: bool,
}

/// The report persistence pipeline over injected stores.
pub struct ReportPipeline<'a> {
    annotations: &'a dyn AnnotationStore,
    samples: &'a dyn SampleStore,
    isgls: &'a dyn IsglStore,
    artifacts: &'a dyn ArtifactStore,
    snapshots: &'a dyn SnapshotStore,
    policy: RetryPolicy,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(
        annotations: &'a dyn AnnotationStore,
        samples: &'a dyn SampleStore,
        isgls: &'a dyn IsglStore,
        artifacts: &'a dyn ArtifactStore,
        snapshots: &'a dyn SnapshotStore,
    ) -> Self {
        Self {
            annotations,
            samples,
            isgls,
            artifacts,
            snapshots,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Finalize a report for a sample.
    ///
    /// On `PartialPersist` the artifact is already durable; calling again
    /// with `resume` set to the reported id completes the bookkeeping
    /// without writing anything twice.
    pub fn finalize_report(&self, req: FinalizeRequest) -> Result<FinalizeOutcome, ReportError> {
        // 1. Scope and resolve. Out-of-scope variants are dropped here,
        // before any number is consumed.
        let sample = self
            .samples
            .get(&req.sample_id)?
            .ok_or_else(|| ReportError::SampleNotFound(req.sample_id.clone()))?;
        let scope = sample.scope();

        let isgl_genes = resolve_selection(&sample, self.isgls)?;
        let genes = effective_gene_set(
            &req.baseline_genes,
            &isgl_genes,
            &sample.genelists.adhoc_genes,
            sample.family(),
        );

        let resolver = AnnotationResolver::new(self.annotations);
        let mut included: Vec<(&ReportVariant, Resolution)> = Vec::new();
        for variant in &req.variants {
            if !genes.contains(&variant.gene) {
                continue;
            }
            let resolution = resolver.resolve(&variant.identity, &scope)?;
            included.push((variant, resolution));
        }
        if included.len() < req.variants.len() {
            log::debug!(
                "sample {}: {} of {} variants outside the effective gene set",
                req.sample_id,
                req.variants.len() - included.len(),
                req.variants.len()
            );
        }

        // 2. Allocate, or pick up where a previous attempt stopped. A
        // resumed id keeps its number; a fresh allocation is consumed even
        // if a later step fails.
        let (report_num, report_id, resumed) = match &req.resume {
            Some(report_id) => (
                parse_report_num(report_id, &req.sample_id)?,
                report_id.clone(),
                true,
            ),
            None => {
                let sequencer = ReportSequencer::with_policy(self.samples, self.policy.clone());
                let num = sequencer.next_report_number(&req.sample_id)?;
                (num, format!("{}.{}", req.sample_id, num), false)
            }
        };

        // 3. Artifact write, collision-checked by content fingerprint.
        let content_sha256 = sha256_hex(&req.body);
        match self.artifacts.write_once(&req.filename, &req.body)? {
            WriteOnceOutcome::Written => {
                log::info!("report {report_id}: artifact written to {}", req.filename);
            }
            WriteOnceOutcome::AlreadyExists { existing_sha256 } => {
                if existing_sha256 != content_sha256 {
                    return Err(ReportError::ArtifactMismatch {
                        path: req.filename.clone(),
                    });
                }
                log::info!("report {report_id}: artifact already durable, resuming");
            }
        }

        let artifact = ReportArtifact {
            report_id: report_id.clone(),
            report_num,
            sample_id: req.sample_id.clone(),
            filepath: req.filename.clone(),
            content_sha256,
            author: req.author.clone(),
            created_at: Utc::now(),
        };

        // 4. Sample bookkeeping. From here on the artifact exists, so
        // failures surface the report id for a resumed retry.
        self.samples
            .append_report_entry(
                &req.sample_id,
                ReportEntry {
                    report_id: report_id.clone(),
                    report_num,
                    filepath: req.filename.clone(),
                    author: req.author.clone(),
                    created_at: artifact.created_at,
                },
            )
            .map_err(|source| ReportError::PartialPersist {
                report_id: report_id.clone(),
                source,
            })?;

        // 5. Snapshot rows: report-time truth, idempotent per identity.
        let created_on = Utc::now();
        let rows: Vec<ReportedVariantSnapshot> = included
            .iter()
            .map(|(variant, resolution)| ReportedVariantSnapshot {
                report_id: report_id.clone(),
                sample_id: req.sample_id.clone(),
                identity_digest: variant.identity.digest(),
                identity: variant.identity.clone(),
                tier: resolution.tier(),
                gene: variant.gene.clone(),
                transcript: variant.transcript.clone(),
                hgvsp: variant.identity.protein.as_ref().map(|r| r.display.clone()),
                hgvsc: variant.identity.coding.as_ref().map(|r| r.display.clone()),
                annotation_id: resolution.class.as_ref().map(|r| r.id),
                text_id: resolution.text.as_ref().map(|r| r.id),
                created_on,
            })
            .collect();

        let snapshot_rows = SnapshotWriter::new(self.snapshots).write(&report_id, rows);
        log::info!(
            "report {report_id} finalized: {} variants on report, {snapshot_rows} snapshot rows written",
            included.len()
        );

        Ok(FinalizeOutcome {
            artifact,
            snapshot_rows,
            resumed,
        })
    }
}

/// Recover the report number from a resume id of the form
/// `<sample_id>.<num>`.
fn parse_report_num(report_id: &str, sample_id: &str) -> Result<u32, ReportError> {
    let bad = || ReportError::BadResumeId(report_id.to_string());
    let (prefix, num) = report_id.rsplit_once('.').ok_or_else(bad)?;
    if prefix != sample_id {
        return Err(bad());
    }
    num.parse::<u32>().map_err(|_| bad())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_id_round_trips() {
        assert_eq!(parse_report_num("25MD08436.3", "25MD08436").unwrap(), 3);
        // Sample ids containing dots still parse from the last segment.
        assert_eq!(parse_report_num("a.b.2", "a.b").unwrap(), 2);
    }

    #[test]
    fn resume_id_for_wrong_sample_is_rejected() {
        assert!(matches!(
            parse_report_num("OTHER.1", "25MD08436"),
            Err(ReportError::BadResumeId(_))
        ));
        assert!(matches!(
            parse_report_num("25MD08436.x", "25MD08436"),
            Err(ReportError::BadResumeId(_))
        ));
        assert!(matches!(
            parse_report_num("nodelimiter", "nodelimiter"),
            Err(ReportError::BadResumeId(_))
        ));
    }
}
