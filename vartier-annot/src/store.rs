//! Annotation store interface and the in-memory implementation.
//!
//! The store is an injected dependency, never a singleton: production
//! wires a document-store adapter, tests and embedded use wire
//! [`MemoryAnnotationStore`]. Records are append-mostly and shared
//! read-only across samples; classifications are global knowledge reused
//! by every future sample carrying the same variant.

use std::sync::{Mutex, PoisonError};

use vartier_core::errors::StoreError;
use vartier_core::models::{
    AnnotationKind, AnnotationRecord, IdentityKey, NewAnnotation, RecordScope, ScopeFilter,
    VariantIdentity,
};

/// Append-only repository of annotation records, queryable by identity
/// key and scope.
///
/// `find` applies coarse eligibility only (kind, key, assay or legacy);
/// preference ranking between subpanel, assay-wide and legacy records is
/// the resolver's concern. `delete_exact` matches identity AND scope
/// exactly, never a superset, so a retraction cannot erase a
/// broader-scoped record.
pub trait AnnotationStore: Send + Sync {
    fn find(
        &self,
        key: &IdentityKey,
        kind: AnnotationKind,
        filter: &ScopeFilter,
    ) -> Result<Vec<AnnotationRecord>, StoreError>;

    fn insert(&self, record: NewAnnotation) -> Result<AnnotationRecord, StoreError>;

    fn delete_exact(
        &self,
        identity: &VariantIdentity,
        scope: &RecordScope,
        kind: AnnotationKind,
    ) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: u64,
    records: Vec<AnnotationRecord>,
}

/// In-memory annotation store. Ids are assigned in insertion order and
/// double as the resolution tie-break.
#[derive(Debug, Default)]
pub struct MemoryAnnotationStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of records held, mostly useful in tests.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnnotationStore for MemoryAnnotationStore {
    fn find(
        &self,
        key: &IdentityKey,
        kind: AnnotationKind,
        filter: &ScopeFilter,
    ) -> Result<Vec<AnnotationRecord>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .records
            .iter()
            .filter(|r| r.payload.kind() == kind)
            .filter(|r| r.identity.has_key(key))
            .filter(|r| filter.admits(&r.scope))
            .cloned()
            .collect())
    }

    fn insert(&self, record: NewAnnotation) -> Result<AnnotationRecord, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let stored = AnnotationRecord {
            id: inner.next_id,
            identity: record.identity,
            scope: record.scope,
            payload: record.payload,
            author: record.author,
            created_at: record.created_at,
        };
        inner.records.push(stored.clone());
        Ok(stored)
    }

    fn delete_exact(
        &self,
        identity: &VariantIdentity,
        scope: &RecordScope,
        kind: AnnotationKind,
    ) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let before = inner.records.len();
        inner.records.retain(|r| {
            !(r.payload.kind() == kind && r.identity == *identity && r.scope == *scope)
        });
        Ok(before - inner.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vartier_core::models::{AnnotationPayload, IdentityLevel, Scope, Tier};

    fn identity(hgvsp: &str) -> VariantIdentity {
        VariantIdentity::from_parts(Some(hgvsp), None, None).unwrap()
    }

    fn class_record(hgvsp: &str, scope: RecordScope, tier: Tier) -> NewAnnotation {
        NewAnnotation {
            identity: identity(hgvsp),
            scope,
            payload: AnnotationPayload::Class(tier),
            author: "kp".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = MemoryAnnotationStore::new();
        let scope = RecordScope::Scoped(Scope::assay_wide("myeloid"));
        let a = store
            .insert(class_record("p.V600E", scope.clone(), Tier::I))
            .unwrap();
        let b = store.insert(class_record("p.V600E", scope, Tier::II)).unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn find_filters_kind_key_and_assay() {
        let store = MemoryAnnotationStore::new();
        let solid = RecordScope::Scoped(Scope::assay_wide("solid_GMSv3"));
        let myeloid = RecordScope::Scoped(Scope::assay_wide("myeloid"));
        store
            .insert(class_record("p.V600E", solid.clone(), Tier::I))
            .unwrap();
        store
            .insert(class_record("p.V600E", myeloid, Tier::III))
            .unwrap();
        store
            .insert(class_record("p.G12D", solid, Tier::II))
            .unwrap();

        let key = identity("p.V600E").key_at(IdentityLevel::Protein).unwrap();
        let found = store
            .find(
                &key,
                AnnotationKind::Class,
                &ScopeFilter::for_assay("solid_GMSv3"),
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier(), Some(Tier::I));
    }

    #[test]
    fn legacy_records_are_admitted_for_any_assay() {
        let store = MemoryAnnotationStore::new();
        store
            .insert(class_record("p.V600E", RecordScope::Legacy, Tier::II))
            .unwrap();

        let key = identity("p.V600E").key_at(IdentityLevel::Protein).unwrap();
        let found = store
            .find(&key, AnnotationKind::Class, &ScopeFilter::for_assay("wts"))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn delete_exact_requires_identical_scope() {
        let store = MemoryAnnotationStore::new();
        let assay_wide = RecordScope::Scoped(Scope::assay_wide("solid_GMSv3"));
        store
            .insert(class_record("p.V600E", assay_wide.clone(), Tier::I))
            .unwrap();

        let narrower = RecordScope::Scoped(Scope::subpanel("solid_GMSv3", "BP"));
        let removed = store
            .delete_exact(&identity("p.V600E"), &narrower, AnnotationKind::Class)
            .unwrap();
        assert_eq!(removed, 0);

        let removed = store
            .delete_exact(&identity("p.V600E"), &assay_wide, AnnotationKind::Class)
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_empty());
    }
}
