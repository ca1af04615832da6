use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::VariantIdentity;
use super::scope::RecordScope;
use super::tier::Tier;

/// The two kinds of annotation facts kept per variant: a classification
/// and a free-text interpretation. A variant can have either without the
/// other; they resolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Class,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationPayload {
    Class(Tier),
    Text(String),
}

impl AnnotationPayload {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationPayload::Class(_) => AnnotationKind::Class,
            AnnotationPayload::Text(_) => AnnotationKind::Text,
        }
    }
}

/// An append-only annotation fact. Records are never edited in place;
/// superseding knowledge appends a newer record, and retraction removes
/// records under an exact identity and scope match.
///
/// `id` is assigned by the store in insertion order and doubles as the
/// deterministic tie-break when two records share a timestamp, so
/// resolution stays reproducible under clock skew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: u64,
    pub identity: VariantIdentity,
    pub scope: RecordScope,
    pub payload: AnnotationPayload,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl AnnotationRecord {
    pub fn tier(&self) -> Option<Tier> {
        match &self.payload {
            AnnotationPayload::Class(t) => Some(*t),
            AnnotationPayload::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            AnnotationPayload::Text(t) => Some(t),
            AnnotationPayload::Class(_) => None,
        }
    }
}

/// Fields for a record about to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub identity: VariantIdentity,
    pub scope: RecordScope,
    pub payload: AnnotationPayload,
    pub author: String,
    pub created_at: DateTime<Utc>,
}
