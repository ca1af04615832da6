use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::scope::{AssayFamily, Scope};

/// The curated and ad-hoc gene selection attached to a sample: ids of
/// in-silico gene lists plus case-specific gene additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenelistSelection {
    pub isgl_ids: Vec<String>,
    pub adhoc_genes: BTreeSet<String>,
}

impl GenelistSelection {
    pub fn is_empty(&self) -> bool {
        self.isgl_ids.is_empty() && self.adhoc_genes.is_empty()
    }
}

/// A free-text note on a sample. Comments are hidden rather than deleted
/// so the discussion trail survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleComment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub hidden: bool,
}

/// Report metadata embedded in the sample aggregate after a successful
/// finalize. The sample exclusively owns these entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub report_id: String,
    pub report_num: u32,
    pub filepath: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleStatus {
    Live,
    Reported,
}

/// Mutable sample aggregate. `report_num` is the one field under strict
/// atomic-update discipline (see the sample store contract); everything
/// else is last-writer-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub assay: String,
    pub subpanel: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub genelists: GenelistSelection,
    pub comments: Vec<SampleComment>,
    pub reports: Vec<ReportEntry>,
    pub report_num: u32,
}

impl Sample {
    pub fn new(id: &str, assay: &str) -> Self {
        Self {
            id: id.to_string(),
            assay: assay.to_string(),
            subpanel: None,
            filters: BTreeMap::new(),
            genelists: GenelistSelection::default(),
            comments: Vec::new(),
            reports: Vec::new(),
            report_num: 0,
        }
    }

    pub fn with_subpanel(mut self, subpanel: &str) -> Self {
        self.subpanel = Some(subpanel.to_string());
        self
    }

    pub fn with_genelists(mut self, genelists: GenelistSelection) -> Self {
        self.genelists = genelists;
        self
    }

    /// Derived, not stored: a sample is live until its first report.
    pub fn status(&self) -> SampleStatus {
        if self.report_num == 0 {
            SampleStatus::Live
        } else {
            SampleStatus::Reported
        }
    }

    pub fn family(&self) -> AssayFamily {
        AssayFamily::classify(&self.assay)
    }

    /// The resolution scope this sample's annotations are read under.
    pub fn scope(&self) -> Scope {
        Scope {
            assay: self.assay.clone(),
            subpanel: self.subpanel.clone(),
        }
    }

    pub fn add_comment(&mut self, author: &str, text: &str) {
        self.comments.push(SampleComment {
            author: author.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            hidden: false,
        });
    }

    /// Hide a comment by index. Out-of-range indexes are ignored; comment
    /// state is not correctness-critical.
    pub fn hide_comment(&mut self, index: usize) {
        if let Some(c) = self.comments.get_mut(index) {
            c.hidden = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derives_from_report_num() {
        let mut sample = Sample::new("25MD08436", "myeloid_GMSv1");
        assert_eq!(sample.status(), SampleStatus::Live);
        sample.report_num = 1;
        assert_eq!(sample.status(), SampleStatus::Reported);
    }

    #[test]
    fn scope_carries_subpanel() {
        let sample = Sample::new("S1", "solid_GMSv3").with_subpanel("BP");
        let scope = sample.scope();
        assert_eq!(scope.assay, "solid_GMSv3");
        assert_eq!(scope.subpanel.as_deref(), Some("BP"));
        assert_eq!(sample.family(), AssayFamily::Solid);
    }

    #[test]
    fn comments_hide_not_delete() {
        let mut sample = Sample::new("S1", "wts");
        sample.add_comment("kp", "low tumor content");
        sample.hide_comment(0);
        sample.hide_comment(7); // out of range, no-op
        assert_eq!(sample.comments.len(), 1);
        assert!(sample.comments[0].hidden);
    }
}
