//! Field-existence and species filters layered onto a built query.

use serde_json::Value;

use crate::models::{Filter, Search, SearchOptions, ALL_SPECIES};
use crate::query::QueryError;

const TAXID_FIELD: &str = "taxid";

/// Applies `entrezonly`, `ensemblonly`, `exists` and `missing`
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExistenceFilter;

impl FieldExistenceFilter {
    pub fn apply(search: Search, options: &SearchOptions) -> Search {
        search.map_query(|mut query| {
            if options.entrezonly {
                query = query.filter(Filter::exists("entrezgene"));
            }
            if options.ensemblonly {
                query = query.filter(Filter::exists("ensembl.gene"));
            }
            for field in options.missing.iter().flatten() {
                query = query.exclude(Filter::exists(field.as_str()));
            }
            for field in options.exists.iter().flatten() {
                query = query.filter(Filter::exists(field.as_str()));
            }
            query
        })
    }
}

/// Restricts results to taxa and applies the facet post-filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeciesFilter;

impl SpeciesFilter {
    pub fn apply(search: Search, options: &SearchOptions) -> Result<Search, QueryError> {
        let mut search = match Self::taxids(&options.species)? {
            Some(taxids) => search.map_query(|q| q.filter(Filter::terms(TAXID_FIELD, taxids))),
            None => search,
        };

        if options.aggs {
            if let Some(facets) = options
                .species_facet_filter
                .as_deref()
                .filter(|f| !f.is_empty())
            {
                let taxids = parse_taxids(facets)?;
                search = search.post_filter(Filter::terms(TAXID_FIELD, taxids));
            }
        }

        Ok(search)
    }

    /// Validate a species list.
    ///
    /// Returns `None` when the list is empty or `"all"` is present, otherwise
    /// the taxon ids. Ids must fit in a `u64`.
    pub fn taxids(species: &[Value]) -> Result<Option<Vec<u64>>, QueryError> {
        if species.is_empty() || species.iter().any(|v| v.as_str() == Some(ALL_SPECIES)) {
            return Ok(None);
        }
        parse_taxids(species).map(Some)
    }
}

fn parse_taxids(values: &[Value]) -> Result<Vec<u64>, QueryError> {
    let strings = values
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<&str>>>()
        .ok_or_else(|| {
            QueryError::InvalidInput("species must be strings or integer strings.".to_string())
        })?;

    strings
        .into_iter()
        .map(|s| {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<u64>().ok()
        })
        .collect::<Option<Vec<u64>>>()
        .ok_or_else(|| QueryError::InvalidInput("cannot map some species to taxids.".to_string()))
}
