//! Core data models for gene queries and taxonomy data.

mod options;
mod query;
mod species;
mod taxon;

pub use options::{SearchOptions, ALL_SPECIES};
pub use query::{
    Filter, FilterClause, IntervalQuery, ScoreFunction, ScoreMode, Search, StructuredQuery,
};
pub use species::{default_species, SpeciesCatalog, SpeciesInfo, DEFAULT_POSITION_FIELD};
pub use taxon::TaxonNode;
