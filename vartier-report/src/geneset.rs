//! Effective gene-set computation.
//!
//! Merges the assay's baseline panel genes with curated in-silico gene
//! list selections and case-specific ad-hoc genes, under the
//! family-specific rules held in [`AssayFamily`].

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use vartier_core::errors::StoreError;
use vartier_core::models::{AssayFamily, EffectiveGeneSet, Sample};

/// Curated gene list lookup. Lists are reusable across samples; a sample
/// references them by id.
pub trait IsglStore: Send + Sync {
    fn genes(&self, isgl_id: &str) -> Result<Option<BTreeSet<String>>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryIsglStore {
    lists: Mutex<HashMap<String, BTreeSet<String>>>,
}

impl MemoryIsglStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, G>(&self, isgl_id: &str, genes: I)
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        let mut lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        lists.insert(
            isgl_id.to_string(),
            genes.into_iter().map(Into::into).collect(),
        );
    }
}

impl IsglStore for MemoryIsglStore {
    fn genes(&self, isgl_id: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        let lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(lists.get(isgl_id).cloned())
    }
}

/// Union of the curated lists a sample has selected. A selection naming a
/// list the store does not know is a configuration fault and surfaces as
/// `NotFound` rather than silently shrinking the gene scope.
pub fn resolve_selection(
    sample: &Sample,
    store: &dyn IsglStore,
) -> Result<BTreeSet<String>, StoreError> {
    let mut union = BTreeSet::new();
    for isgl_id in &sample.genelists.isgl_ids {
        match store.genes(isgl_id)? {
            Some(genes) => union.extend(genes),
            None => {
                return Err(StoreError::NotFound(format!(
                    "gene list {isgl_id} selected by sample {}",
                    sample.id
                )));
            }
        }
    }
    Ok(union)
}

/// Compute the gene scope for one sample.
///
/// Ordinary families restrict the baseline: with no selection the
/// baseline applies unrestricted, with a selection the result is
/// `baseline ∩ (isgl ∪ adhoc)`. Whole-genome/transcriptome families have
/// no meaningful baseline; their selection is the sole filter, and an
/// empty selection means unrestricted, never the empty set.
pub fn effective_gene_set(
    baseline: &BTreeSet<String>,
    isgl_genes: &BTreeSet<String>,
    adhoc_genes: &BTreeSet<String>,
    family: AssayFamily,
) -> EffectiveGeneSet {
    let selection: BTreeSet<String> = isgl_genes.union(adhoc_genes).cloned().collect();

    if family.selection_is_sole_filter() {
        if selection.is_empty() {
            return EffectiveGeneSet::Unrestricted;
        }
        return EffectiveGeneSet::Genes(selection);
    }

    if selection.is_empty() {
        EffectiveGeneSet::Genes(baseline.clone())
    } else {
        EffectiveGeneSet::Genes(baseline.intersection(&selection).cloned().collect())
    }
}

/// Gene scope for a sample given its assay baseline: resolves the curated
/// selection and applies the family rule.
pub fn effective_genes_for_sample(
    sample: &Sample,
    baseline: &BTreeSet<String>,
    isgls: &dyn IsglStore,
) -> Result<EffectiveGeneSet, StoreError> {
    let isgl_genes = resolve_selection(sample, isgls)?;
    Ok(effective_gene_set(
        baseline,
        &isgl_genes,
        &sample.genelists.adhoc_genes,
        sample.family(),
    ))
}
