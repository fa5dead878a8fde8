//! Taxonomy lookups and descendant expansion.
//!
//! This module defines the [`TaxonomyStore`] trait over the taxonomy
//! reference data and the [`TaxonomyExpander`] built on top of it. Two stores
//! are provided:
//!
//! - [`EsTaxonomyStore`]: the taxonomy index of a search engine, over HTTP
//! - [`InMemoryTaxonomyStore`]: a fixed snapshot, for tests and offline use
//!
//! Stores must be safe for concurrent use; the expander keeps no state
//! between calls.

mod es;
mod memory;

pub use es::EsTaxonomyStore;
pub use memory::InMemoryTaxonomyStore;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{SearchOptions, TaxonNode};
use crate::query::{QueryError, SpeciesFilter};

/// Default cap on descendants returned per lineage query
pub const DEFAULT_RESULT_SIZE: usize = 1000;

/// Default cap on an expanded species list
pub const DEFAULT_MAX_EXPANDED: usize = 1000;

/// Read-only access to taxonomy reference data
#[async_trait]
pub trait TaxonomyStore: Send + Sync + std::fmt::Debug {
    /// Fetch a taxon, `None` when the id is unknown
    async fn get_taxon(&self, taxid: u64) -> Result<Option<TaxonNode>, TaxonomyError>;

    /// Ids of taxa whose lineage contains `taxid`, at most `size` of them.
    ///
    /// With `has_gene`, only taxa with at least one gene record are returned.
    async fn lineage_members(
        &self,
        taxid: u64,
        has_gene: bool,
        size: usize,
    ) -> Result<Vec<u64>, TaxonomyError>;
}

/// Errors that can occur when talking to a taxonomy store
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The store answered with an error status
    #[error("API error: {0}")]
    Api(String),

    /// Invalid store configuration or request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Species input could not be mapped to taxon ids
    #[error(transparent)]
    InvalidInput(#[from] QueryError),
}

impl From<reqwest::Error> for TaxonomyError {
    fn from(err: reqwest::Error) -> Self {
        TaxonomyError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TaxonomyError {
    fn from(err: serde_json::Error) -> Self {
        TaxonomyError::Parse(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for TaxonomyError {
    fn from(err: url::ParseError) -> Self {
        TaxonomyError::InvalidRequest(format!("URL: {}", err))
    }
}

/// Resolves taxa and their descendants
#[derive(Debug, Clone)]
pub struct TaxonomyExpander {
    store: Arc<dyn TaxonomyStore>,
    result_size: usize,
}

impl TaxonomyExpander {
    pub fn new(store: Arc<dyn TaxonomyStore>) -> Self {
        Self {
            store,
            result_size: DEFAULT_RESULT_SIZE,
        }
    }

    /// Set the per-query descendant cap
    pub fn with_result_size(mut self, size: usize) -> Self {
        self.result_size = size;
        self
    }

    /// Look up a taxon, optionally attaching its descendants (excluding itself)
    pub async fn get_species_info(
        &self,
        taxid: u64,
        include_children: bool,
    ) -> Result<Option<TaxonNode>, TaxonomyError> {
        let Some(mut node) = self.store.get_taxon(taxid).await? else {
            tracing::debug!(taxid, "taxon not found");
            return Ok(None);
        };

        if include_children {
            node.children = Some(self.get_all_children_tax_ids(taxid, true, false).await?);
        }
        Ok(Some(node))
    }

    /// All taxa descending from `taxid`, sorted and deduplicated
    pub async fn get_all_children_tax_ids(
        &self,
        taxid: u64,
        has_gene: bool,
        include_self: bool,
    ) -> Result<Vec<u64>, TaxonomyError> {
        let members = self
            .store
            .lineage_members(taxid, has_gene, self.result_size)
            .await?;

        let mut ids: BTreeSet<u64> = members.into_iter().collect();
        if include_self {
            ids.insert(taxid);
        } else {
            ids.remove(&taxid);
        }

        tracing::debug!(taxid, has_gene, count = ids.len(), "resolved descendants");
        Ok(ids.into_iter().collect())
    }

    /// Union of the descendants of every taxon in `taxids`, capped at `max`.
    ///
    /// Accumulation stops as soon as the union reaches `max`, so when the cap
    /// is hit the result depends on the order of `taxids`.
    pub async fn get_expanded_species_list(
        &self,
        taxids: &[u64],
        max: usize,
    ) -> Result<Vec<u64>, TaxonomyError> {
        let mut expanded = BTreeSet::new();

        for &taxid in taxids {
            expanded.extend(self.get_all_children_tax_ids(taxid, true, true).await?);
            if expanded.len() >= max {
                tracing::debug!(taxid, max, "expanded species list reached cap");
                break;
            }
        }

        Ok(expanded.into_iter().take(max).collect())
    }

    /// Replace the species of `options` with their expanded taxonomy tree.
    ///
    /// Options without `include_tax_tree`, or with `"all"` species, are
    /// returned unchanged.
    pub async fn expand_options(
        &self,
        options: &SearchOptions,
        max: usize,
    ) -> Result<SearchOptions, TaxonomyError> {
        if !options.include_tax_tree {
            return Ok(options.clone());
        }
        let Some(taxids) = SpeciesFilter::taxids(&options.species)? else {
            return Ok(options.clone());
        };

        let expanded = self.get_expanded_species_list(&taxids, max).await?;
        Ok(options
            .clone()
            .species(expanded.iter().map(|id| id.to_string())))
    }
}
