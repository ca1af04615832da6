use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The `(assay, subpanel?)` pair an annotation is authoritative within.
/// Subpanels only carry meaning for the solid family; other families scope
/// on assay alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub assay: String,
    pub subpanel: Option<String>,
}

impl Scope {
    pub fn assay_wide(assay: &str) -> Self {
        Self {
            assay: assay.to_string(),
            subpanel: None,
        }
    }

    pub fn subpanel(assay: &str, subpanel: &str) -> Self {
        Self {
            assay: assay.to_string(),
            subpanel: Some(subpanel.to_string()),
        }
    }

    pub fn family(&self) -> AssayFamily {
        AssayFamily::classify(&self.assay)
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subpanel {
            Some(sp) => write!(f, "{}:{}", self.assay, sp),
            None => write!(f, "{}", self.assay),
        }
    }
}

/// The scope an annotation record was created under. Pre-migration records
/// carry no assay at all and live in their own bucket: they never match a
/// scoped retraction, and resolution only reaches them when nothing scoped
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordScope {
    Scoped(Scope),
    Legacy,
}

impl RecordScope {
    pub fn assay(&self) -> Option<&str> {
        match self {
            RecordScope::Scoped(s) => Some(&s.assay),
            RecordScope::Legacy => None,
        }
    }
}

/// Coarse store-side filter for annotation queries: records are eligible
/// when they are legacy or scoped to the given assay. Finer preference
/// (subpanel ranking) is the resolver's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    pub assay: String,
}

impl ScopeFilter {
    pub fn for_assay(assay: &str) -> Self {
        Self {
            assay: assay.to_string(),
        }
    }

    pub fn admits(&self, scope: &RecordScope) -> bool {
        match scope {
            RecordScope::Scoped(s) => s.assay == self.assay,
            RecordScope::Legacy => true,
        }
    }
}

/// Assay families with family-specific scoping and gene-set rules.
/// All family special-casing goes through the strategy methods below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssayFamily {
    Solid,
    Myeloid,
    Lymphoid,
    TumorExome,
    TumorWgs,
    Wts,
    Other,
}

impl AssayFamily {
    /// Map an assay identifier (e.g. `solid_GMSv3`) to its family by
    /// case-insensitive prefix.
    pub fn classify(assay: &str) -> AssayFamily {
        let lower = assay.trim().to_ascii_lowercase();
        if lower.starts_with("solid") {
            AssayFamily::Solid
        } else if lower.starts_with("myeloid") {
            AssayFamily::Myeloid
        } else if lower.starts_with("lymph") {
            AssayFamily::Lymphoid
        } else if lower.starts_with("tumexome") || lower.starts_with("exome") {
            AssayFamily::TumorExome
        } else if lower.starts_with("tumwgs") {
            AssayFamily::TumorWgs
        } else if lower.starts_with("wts") {
            AssayFamily::Wts
        } else {
            AssayFamily::Other
        }
    }

    /// Only the solid family scopes annotations down to subpanels.
    pub fn uses_subpanel_scope(self) -> bool {
        matches!(self, AssayFamily::Solid)
    }

    /// Whole-genome and whole-transcriptome assays have no meaningful
    /// fixed gene baseline; the curated/ad-hoc selection is the sole
    /// filter.
    pub fn selection_is_sole_filter(self) -> bool {
        matches!(self, AssayFamily::TumorWgs | AssayFamily::Wts)
    }
}
