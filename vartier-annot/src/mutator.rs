//! Classification and text mutation.
//!
//! All writes are appends; existing records are never edited, so the
//! audit trail stays intact. Retraction removes records under an exact
//! identity and scope match only.

use chrono::Utc;

use vartier_core::errors::StoreError;
use vartier_core::models::{
    AnnotationKind, AnnotationPayload, AnnotationRecord, NewAnnotation, RecordScope, Scope, Tier,
    VariantIdentity,
};

use crate::store::AnnotationStore;

/// Outcome of a bulk classification. Writes are independent: a failure on
/// one identity never rolls back the others, and every failure is
/// reported against the identity it belongs to.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub applied: Vec<AnnotationRecord>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug)]
pub struct BulkFailure {
    /// Position in the submitted identity list.
    pub index: usize,
    pub identity: String,
    pub reason: String,
}

impl BulkOutcome {
    pub fn all_applied(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ClassificationMutator<'s, S: AnnotationStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: AnnotationStore + ?Sized> ClassificationMutator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Append a classification record. The scope is stored exactly as
    /// given; a later retraction must name the same scope to remove it.
    pub fn apply(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
        tier: Tier,
        author: &str,
    ) -> Result<AnnotationRecord, StoreError> {
        if scope.subpanel.is_some() && !scope.family().uses_subpanel_scope() {
            log::debug!(
                "classification for {} carries subpanel {:?} on non-subpanel assay {}",
                identity,
                scope.subpanel,
                scope.assay
            );
        }
        self.store.insert(NewAnnotation {
            identity: identity.clone(),
            scope: RecordScope::Scoped(scope.clone()),
            payload: AnnotationPayload::Class(tier),
            author: author.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Append an interpretation-text record, same discipline as `apply`.
    pub fn apply_text(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
        text: &str,
        author: &str,
    ) -> Result<AnnotationRecord, StoreError> {
        self.store.insert(NewAnnotation {
            identity: identity.clone(),
            scope: RecordScope::Scoped(scope.clone()),
            payload: AnnotationPayload::Text(text.to_string()),
            author: author.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Remove classification records matching this identity and exactly
    /// this scope. Zero removals is a normal outcome, not an error; it
    /// means no record was created under that precise scope. Legacy
    /// (assay-less) records are never reachable from here.
    pub fn retract(&self, identity: &VariantIdentity, scope: &Scope) -> Result<usize, StoreError> {
        let removed = self.store.delete_exact(
            identity,
            &RecordScope::Scoped(scope.clone()),
            AnnotationKind::Class,
        )?;
        if removed == 0 {
            log::debug!("retraction for {} matched no record in scope {}", identity, scope);
        }
        Ok(removed)
    }

    pub fn retract_text(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
    ) -> Result<usize, StoreError> {
        self.store.delete_exact(
            identity,
            &RecordScope::Scoped(scope.clone()),
            AnnotationKind::Text,
        )
    }

    /// Apply the same tier to many identities. Each write is independent
    /// and individually auditable; identities that fail are reported with
    /// their position and reason while the rest proceed.
    pub fn apply_bulk(
        &self,
        identities: &[VariantIdentity],
        scope: &Scope,
        tier: Tier,
        author: &str,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for (index, identity) in identities.iter().enumerate() {
            if identity.keys().is_empty() {
                outcome.failed.push(BulkFailure {
                    index,
                    identity: identity.label(),
                    reason: "no usable identity representation".to_string(),
                });
                continue;
            }
            match self.apply(identity, scope, tier, author) {
                Ok(record) => outcome.applied.push(record),
                Err(e) => outcome.failed.push(BulkFailure {
                    index,
                    identity: identity.label(),
                    reason: e.to_string(),
                }),
            }
        }
        if !outcome.failed.is_empty() {
            log::warn!(
                "bulk classification: {} applied, {} failed",
                outcome.applied.len(),
                outcome.failed.len()
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AnnotationResolver;
    use crate::store::MemoryAnnotationStore;
    use pretty_assertions::assert_eq;

    fn identity(hgvsp: &str) -> VariantIdentity {
        VariantIdentity::from_parts(Some(hgvsp), None, None).unwrap()
    }

    #[test]
    fn apply_appends_instead_of_editing() {
        let store = MemoryAnnotationStore::new();
        let mutator = ClassificationMutator::new(&store);
        let id = identity("p.V600E");
        let scope = Scope::assay_wide("myeloid");

        mutator.apply(&id, &scope, Tier::III, "kp").unwrap();
        mutator.apply(&id, &scope, Tier::I, "kp").unwrap();

        // Both records exist; resolution sees the latest.
        assert_eq!(store.len(), 2);
        let resolver = AnnotationResolver::new(&store);
        assert_eq!(resolver.resolve_tier(&id, &scope).unwrap(), Some(Tier::I));
    }

    #[test]
    fn retraction_is_scope_exact() {
        let store = MemoryAnnotationStore::new();
        let mutator = ClassificationMutator::new(&store);
        let id = identity("p.V600E");
        mutator
            .apply(&id, &Scope::assay_wide("solid_GMSv3"), Tier::I, "kp")
            .unwrap();

        // Different scope: nothing retracted, and that is not an error.
        let n = mutator
            .retract(&id, &Scope::subpanel("solid_GMSv3", "BP"))
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(store.len(), 1);

        let n = mutator.retract(&id, &Scope::assay_wide("solid_GMSv3")).unwrap();
        assert_eq!(n, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn retract_leaves_text_records_alone() {
        let store = MemoryAnnotationStore::new();
        let mutator = ClassificationMutator::new(&store);
        let id = identity("p.V600E");
        let scope = Scope::assay_wide("myeloid");
        mutator.apply(&id, &scope, Tier::II, "kp").unwrap();
        mutator
            .apply_text(&id, &scope, "Activating BRAF hotspot.", "kp")
            .unwrap();

        assert_eq!(mutator.retract(&id, &scope).unwrap(), 1);
        let resolver = AnnotationResolver::new(&store);
        let resolution = resolver.resolve(&id, &scope).unwrap();
        assert!(resolution.class.is_none());
        assert_eq!(
            resolution.text.as_ref().and_then(|r| r.text()),
            Some("Activating BRAF hotspot.")
        );
    }

    #[test]
    fn bulk_apply_reports_failures_individually() {
        let store = MemoryAnnotationStore::new();
        let mutator = ClassificationMutator::new(&store);
        let scope = Scope::assay_wide("myeloid");

        // A hollow identity can only come from deserialized legacy data,
        // but the bulk path still has to report it rather than abort.
        let hollow = VariantIdentity {
            protein: None,
            coding: None,
            genomic: None,
        };
        let identities = vec![identity("p.V600E"), hollow, identity("p.G12D")];

        let outcome = mutator.apply_bulk(&identities, &scope, Tier::II, "kp");
        assert_eq!(outcome.applied.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].index, 1);
        assert!(!outcome.all_applied());
        assert_eq!(store.len(), 2);
    }
}
