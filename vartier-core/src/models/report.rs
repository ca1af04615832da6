use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finalized report artifact. For a given sample, `report_num` values
/// are unique and increase by 1 from 1; the sequencer's atomic allocation
/// is what upholds that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub report_id: String,
    pub report_num: u32,
    pub sample_id: String,
    pub filepath: String,
    pub content_sha256: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}
