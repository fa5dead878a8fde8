//! Per-request search options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::SpeciesCatalog;

/// Sentinel species value that disables taxon filtering
pub const ALL_SPECIES: &str = "all";

/// Options controlling filtering and dispatch of a gene query.
///
/// Species values are kept as raw JSON so that malformed input (for
/// example a bare integer from a JSON body) is rejected by the species
/// filter with a precise message rather than by deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Only genes with an Entrez id
    pub entrezonly: bool,

    /// Only genes with an Ensembl gene id
    pub ensemblonly: bool,

    /// Fields that must be present
    pub exists: Option<Vec<String>>,

    /// Fields that must be absent
    pub missing: Option<Vec<String>>,

    /// Taxon ids to restrict to, or `"all"`
    pub species: Vec<Value>,

    /// Taxon ids applied after aggregation
    pub species_facet_filter: Option<Vec<Value>>,

    /// Whether aggregations are requested
    pub aggs: bool,

    /// Whether `__any__` returns random documents
    pub allow_random_query: bool,

    /// Expand species to all descendant taxa before filtering
    pub include_tax_tree: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            entrezonly: false,
            ensemblonly: false,
            exists: None,
            missing: None,
            species: vec![Value::String(ALL_SPECIES.to_string())],
            species_facet_filter: None,
            aggs: false,
            allow_random_query: false,
            include_tax_tree: false,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Entrez-only filtering
    pub fn entrezonly(mut self, enabled: bool) -> Self {
        self.entrezonly = enabled;
        self
    }

    /// Set Ensembl-only filtering
    pub fn ensemblonly(mut self, enabled: bool) -> Self {
        self.ensemblonly = enabled;
        self
    }

    /// Require these fields to exist
    pub fn exists<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.exists = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Require these fields to be missing
    pub fn missing<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.missing = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the species list
    pub fn species<S: Into<String>>(mut self, species: impl IntoIterator<Item = S>) -> Self {
        self.species = species
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        self
    }

    /// Set the species facet filter
    pub fn species_facet_filter<S: Into<String>>(
        mut self,
        species: impl IntoIterator<Item = S>,
    ) -> Self {
        self.species_facet_filter = Some(
            species
                .into_iter()
                .map(|s| Value::String(s.into()))
                .collect(),
        );
        self
    }

    /// Enable/disable aggregations
    pub fn aggs(mut self, enabled: bool) -> Self {
        self.aggs = enabled;
        self
    }

    /// Enable/disable the random `__any__` query
    pub fn allow_random_query(mut self, enabled: bool) -> Self {
        self.allow_random_query = enabled;
        self
    }

    /// Enable/disable taxonomy tree expansion
    pub fn include_tax_tree(mut self, enabled: bool) -> Self {
        self.include_tax_tree = enabled;
        self
    }

    /// Whether the species list contains the `"all"` sentinel
    pub fn all_species(&self) -> bool {
        self.species
            .iter()
            .any(|v| v.as_str() == Some(ALL_SPECIES))
    }

    /// Rewrite common species names (`human`, `mouse`, ...) to taxon ids
    pub fn translate_species(mut self, catalog: &SpeciesCatalog) -> Self {
        let translate = |values: Vec<Value>| -> Vec<Value> {
            values
                .into_iter()
                .map(|value| match value.as_str().and_then(|s| catalog.taxid_for_name(s)) {
                    Some(taxid) => Value::String(taxid.to_string()),
                    None => value,
                })
                .collect()
        };

        self.species = translate(self.species);
        self.species_facet_filter = self.species_facet_filter.map(translate);
        self
    }
}
