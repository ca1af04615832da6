//! Classification and interpretation-text resolution.
//!
//! Given a variant identity and a caller scope, finds the most
//! authoritative prior record. Representation levels are walked in
//! preference order (protein, then coding, then genomic); the walk stops
//! at the first level with any eligible record and never merges levels. A
//! protein-level match wins over a newer coding- or genomic-level one.

use std::cmp::Reverse;

use vartier_core::errors::StoreError;
use vartier_core::models::{
    AnnotationKind, AnnotationRecord, AssayFamily, IdentityLevel, RecordScope, Scope, ScopeFilter,
    Tier, VariantIdentity,
};

use crate::store::AnnotationStore;

/// The outcome of resolving one identity: classification and text are
/// independent facts, either can be present without the other.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub class: Option<AnnotationRecord>,
    pub text: Option<AnnotationRecord>,
}

impl Resolution {
    pub fn tier(&self) -> Option<Tier> {
        self.class.as_ref().and_then(|r| r.tier())
    }
}

/// Read-only resolver over an annotation store. Safe to retry
/// unconditionally.
pub struct AnnotationResolver<'s, S: AnnotationStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: AnnotationStore + ?Sized> AnnotationResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Resolve both kinds for an identity under the given scope.
    pub fn resolve(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
    ) -> Result<Resolution, StoreError> {
        Ok(Resolution {
            class: self.resolve_kind(identity, scope, AnnotationKind::Class)?,
            text: self.resolve_kind(identity, scope, AnnotationKind::Text)?,
        })
    }

    /// Convenience for callers that only need the current tier.
    pub fn resolve_tier(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
    ) -> Result<Option<Tier>, StoreError> {
        Ok(self
            .resolve_kind(identity, scope, AnnotationKind::Class)?
            .and_then(|r| r.tier()))
    }

    fn resolve_kind(
        &self,
        identity: &VariantIdentity,
        scope: &Scope,
        kind: AnnotationKind,
    ) -> Result<Option<AnnotationRecord>, StoreError> {
        let family = scope.family();
        let filter = ScopeFilter::for_assay(&scope.assay);

        for level in IdentityLevel::PREFERENCE {
            let Some(key) = identity.key_at(level) else {
                continue;
            };
            let candidates = self.store.find(&key, kind, &filter)?;
            if candidates.is_empty() {
                continue;
            }
            // First level with any eligible record decides; pick the best
            // scope rung, then latest timestamp, then highest id so ties
            // under clock skew resolve deterministically.
            let best = candidates
                .into_iter()
                .max_by_key(|r| (Reverse(scope_rung(&r.scope, scope, family)), r.created_at, r.id));
            return Ok(best);
        }
        Ok(None)
    }
}

/// Preference ladder within one representation level. Lower is better:
/// subpanel-equal beats assay-wide beats legacy for the solid family;
/// other families only distinguish scoped from legacy.
fn scope_rung(record: &RecordScope, caller: &Scope, family: AssayFamily) -> u8 {
    match record {
        RecordScope::Legacy => 2,
        RecordScope::Scoped(s) => {
            if family.uses_subpanel_scope() && s.subpanel == caller.subpanel {
                0
            } else {
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAnnotationStore;
    use chrono::{Duration, Utc};
    use vartier_core::models::{AnnotationPayload, GenomicLocus, NewAnnotation};

    fn insert_class(
        store: &MemoryAnnotationStore,
        identity: &VariantIdentity,
        scope: RecordScope,
        tier: Tier,
        age_minutes: i64,
    ) {
        store
            .insert(NewAnnotation {
                identity: identity.clone(),
                scope,
                payload: AnnotationPayload::Class(tier),
                author: "kp".to_string(),
                created_at: Utc::now() - Duration::minutes(age_minutes),
            })
            .unwrap();
    }

    fn full_identity() -> VariantIdentity {
        VariantIdentity::from_parts(
            Some("p.V600E"),
            Some("NM_004333.4:c.1799T>A"),
            Some(GenomicLocus::new("7", 140453136, "A", "T")),
        )
        .unwrap()
    }

    #[test]
    fn protein_level_beats_newer_genomic_level() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        let scope = Scope::assay_wide("myeloid");

        // Older protein-level record
        let protein_only = VariantIdentity::from_parts(Some("p.V600E"), None, None).unwrap();
        insert_class(
            &store,
            &protein_only,
            RecordScope::Scoped(scope.clone()),
            Tier::I,
            60,
        );
        // Newer genomic-only record
        let genomic_only = VariantIdentity::from_parts(
            None,
            None,
            Some(GenomicLocus::new("7", 140453136, "A", "T")),
        )
        .unwrap();
        insert_class(
            &store,
            &genomic_only,
            RecordScope::Scoped(scope.clone()),
            Tier::III,
            0,
        );

        let resolver = AnnotationResolver::new(&store);
        let resolution = resolver.resolve(&identity, &scope).unwrap();
        assert_eq!(resolution.tier(), Some(Tier::I));
    }

    #[test]
    fn solid_falls_back_from_subpanel_to_assay_wide() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(Scope::assay_wide("solid_GMSv3")),
            Tier::II,
            0,
        );

        let caller = Scope::subpanel("solid_GMSv3", "BP");
        let resolver = AnnotationResolver::new(&store);
        assert_eq!(resolver.resolve_tier(&identity, &caller).unwrap(), Some(Tier::II));
    }

    #[test]
    fn solid_prefers_matching_subpanel_over_newer_assay_wide() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(Scope::subpanel("solid_GMSv3", "BP")),
            Tier::I,
            60,
        );
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(Scope::assay_wide("solid_GMSv3")),
            Tier::III,
            0,
        );

        let caller = Scope::subpanel("solid_GMSv3", "BP");
        let resolver = AnnotationResolver::new(&store);
        assert_eq!(resolver.resolve_tier(&identity, &caller).unwrap(), Some(Tier::I));
    }

    #[test]
    fn non_solid_ignores_subpanel_ranking() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        // Odd but possible: a myeloid record written with a subpanel. For
        // non-solid families it ranks the same as assay-wide, so the
        // newer record wins.
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(Scope::subpanel("myeloid", "X")),
            Tier::III,
            10,
        );
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(Scope::assay_wide("myeloid")),
            Tier::I,
            0,
        );

        let resolver = AnnotationResolver::new(&store);
        let scope = Scope::assay_wide("myeloid");
        assert_eq!(resolver.resolve_tier(&identity, &scope).unwrap(), Some(Tier::I));
    }

    #[test]
    fn legacy_is_last_resort() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        insert_class(&store, &identity, RecordScope::Legacy, Tier::I, 0);

        let resolver = AnnotationResolver::new(&store);
        let scope = Scope::assay_wide("myeloid");
        // Nothing scoped exists, the legacy record is surfaced.
        assert_eq!(resolver.resolve_tier(&identity, &scope).unwrap(), Some(Tier::I));

        // A scoped record shadows it even when older.
        insert_class(
            &store,
            &identity,
            RecordScope::Scoped(scope.clone()),
            Tier::II,
            600,
        );
        assert_eq!(resolver.resolve_tier(&identity, &scope).unwrap(), Some(Tier::II));
    }

    #[test]
    fn equal_timestamps_break_on_record_id() {
        let store = MemoryAnnotationStore::new();
        let identity = full_identity();
        let scope = Scope::assay_wide("myeloid");
        let when = Utc::now();
        for tier in [Tier::III, Tier::II] {
            store
                .insert(NewAnnotation {
                    identity: identity.clone(),
                    scope: RecordScope::Scoped(scope.clone()),
                    payload: AnnotationPayload::Class(tier),
                    author: "kp".to_string(),
                    created_at: when,
                })
                .unwrap();
        }

        let resolver = AnnotationResolver::new(&store);
        // Same timestamp: the later insertion (higher id) wins.
        assert_eq!(resolver.resolve_tier(&identity, &scope).unwrap(), Some(Tier::II));
    }

    #[test]
    fn unknown_variant_resolves_to_nothing() {
        let store = MemoryAnnotationStore::new();
        let resolver = AnnotationResolver::new(&store);
        let resolution = resolver
            .resolve(&full_identity(), &Scope::assay_wide("myeloid"))
            .unwrap();
        assert!(resolution.class.is_none());
        assert!(resolution.text.is_none());
    }
}
