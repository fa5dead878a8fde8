//! # MyGene Query
//!
//! Query construction for a gene annotation search service. Raw user queries
//! and request options are turned into search-engine request bodies.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (StructuredQuery, Search, SearchOptions, etc.)
//! - [`query`]: Query building, datasource translation, scoring and filters
//! - [`taxonomy`]: Taxonomy lookups and species tree expansion
//! - [`utils`]: Shared HTTP client
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod query;
pub mod taxonomy;
pub mod utils;

// Re-export commonly used types
pub use models::{Search, SearchOptions, StructuredQuery};
pub use query::{QueryBuilder, QueryError};
pub use taxonomy::{TaxonomyError, TaxonomyExpander, TaxonomyStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
