//! In-memory taxonomy snapshot for testing and offline use.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::models::TaxonNode;
use crate::taxonomy::{TaxonomyError, TaxonomyStore};

/// A fixed set of taxa held in memory, keyed by taxon id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaxonomyStore {
    nodes: BTreeMap<u64, TaxonNode>,
}

impl InMemoryTaxonomyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of taxa; later duplicates replace earlier ones.
    pub fn from_nodes(nodes: impl IntoIterator<Item = TaxonNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.taxid, n)).collect(),
        }
    }

    /// Add a taxon.
    pub fn with_taxon(mut self, node: TaxonNode) -> Self {
        self.nodes.insert(node.taxid, node);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl TaxonomyStore for InMemoryTaxonomyStore {
    async fn get_taxon(&self, taxid: u64) -> Result<Option<TaxonNode>, TaxonomyError> {
        Ok(self.nodes.get(&taxid).cloned())
    }

    async fn lineage_members(
        &self,
        taxid: u64,
        has_gene: bool,
        size: usize,
    ) -> Result<Vec<u64>, TaxonomyError> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.descends_from(taxid))
            .filter(|n| !has_gene || n.has_gene)
            .map(|n| n.taxid)
            .take(size)
            .collect())
    }
}
