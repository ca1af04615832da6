use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::VariantIdentity;
use super::tier::Tier;

/// Immutable per-report copy of a variant's identity and classification at
/// report-finalization time. Once written it is never updated, even when
/// the live annotation changes later; this is the row that lets reported
/// history show report-time truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedVariantSnapshot {
    pub report_id: String,
    pub sample_id: String,
    /// Identity digest, the idempotency key within a report.
    pub identity_digest: String,
    pub identity: VariantIdentity,
    pub tier: Option<Tier>,
    pub gene: String,
    pub transcript: Option<String>,
    pub hgvsp: Option<String>,
    pub hgvsc: Option<String>,
    /// Id of the classification record the tier was taken from.
    pub annotation_id: Option<u64>,
    /// Id of the text record included in the report, if any.
    pub text_id: Option<u64>,
    pub created_on: DateTime<Utc>,
}
