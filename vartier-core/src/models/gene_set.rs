use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The computed gene scope for a sample. Never persisted; recomputed from
/// the sample, the assay baseline and the curated selections each time.
///
/// `Unrestricted` is an explicit sentinel: whole-genome and
/// whole-transcriptome assays with no selection mean "everything", and
/// encoding that as an empty set would silently zero out downstream
/// filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveGeneSet {
    Unrestricted,
    Genes(BTreeSet<String>),
}

impl EffectiveGeneSet {
    pub fn contains(&self, gene: &str) -> bool {
        match self {
            EffectiveGeneSet::Unrestricted => true,
            EffectiveGeneSet::Genes(genes) => genes.contains(gene),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, EffectiveGeneSet::Unrestricted)
    }

    /// Number of genes in scope, `None` when unrestricted.
    pub fn gene_count(&self) -> Option<usize> {
        match self {
            EffectiveGeneSet::Unrestricted => None,
            EffectiveGeneSet::Genes(genes) => Some(genes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_contains_everything() {
        let set = EffectiveGeneSet::Unrestricted;
        assert!(set.contains("BRAF"));
        assert!(set.contains("anything"));
        assert_eq!(set.gene_count(), None);
    }

    #[test]
    fn restricted_contains_members_only() {
        let set = EffectiveGeneSet::Genes(BTreeSet::from(["BRAF".to_string()]));
        assert!(set.contains("BRAF"));
        assert!(!set.contains("KRAS"));
        assert_eq!(set.gene_count(), Some(1));
    }
}
