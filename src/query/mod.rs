//! Gene query construction.
//!
//! [`QueryBuilder`] turns a raw query string plus [`SearchOptions`] into a
//! [`Search`] ready for the search engine:
//!
//! 1. datasource prefixes are rewritten ([`DatasourceTranslator`])
//! 2. a base query is picked by the first matching strategy in
//!    [`FREE_TEXT_STRATEGIES`]
//! 3. the base is wrapped by [`ScoringPolicy`]
//! 4. [`FieldExistenceFilter`] and [`SpeciesFilter`] add filter clauses
//!
//! Building is synchronous and touches only immutable process-wide tables.

mod filters;
mod interval;
mod scoring;
mod translate;

pub use filters::{FieldExistenceFilter, SpeciesFilter};
pub use interval::{assembly_override, IntervalQueryParser};
pub use scoring::ScoringPolicy;
pub use translate::{DatasourceTranslator, TranslationRule, DATASOURCE_TRANSLATIONS};

use crate::models::{Search, SearchOptions, SpeciesCatalog, StructuredQuery};

/// Query that matches every document
pub const MATCH_ALL_QUERY: &str = "__all__";

/// Query that returns random documents, when allowed
pub const RANDOM_QUERY: &str = "__any__";

/// Default fields for identifier lookups
pub const DEFAULT_SCOPES: &[&str] = &["_id", "entrezgene", "ensembl.gene", "retired"];

/// Tokens that mark a query as Lucene query-string syntax
const QUERY_STRING_TOKENS: &[&str] = &[":", "~", " AND ", " OR ", "NOT "];

/// Errors raised while building a query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The request carried invalid input
    #[error("{0}")]
    InvalidInput(String),
}

impl QueryError {
    /// Whether the caller should report this as a client (4xx) error
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidInput(_))
    }
}

/// Base query kinds for free-text search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    MatchAll,
    RandomScore,
    Interval,
    QueryString,
    Wildcard,
    DefaultMultiMatch,
}

/// Builds a base query when the strategy applies to the input
pub type StrategyFn = fn(&QueryBuilder, &str, &SearchOptions) -> Option<StructuredQuery>;

/// Free-text strategies, tried top to bottom; the first to produce a query wins
pub const FREE_TEXT_STRATEGIES: &[(QueryStrategy, StrategyFn)] = &[
    (QueryStrategy::MatchAll, match_all_strategy),
    (QueryStrategy::RandomScore, random_strategy),
    (QueryStrategy::Interval, interval_strategy),
    (QueryStrategy::QueryString, query_string_strategy),
    (QueryStrategy::Wildcard, wildcard_strategy),
    (QueryStrategy::DefaultMultiMatch, default_strategy),
];

fn match_all_strategy(_: &QueryBuilder, q: &str, _: &SearchOptions) -> Option<StructuredQuery> {
    (q == MATCH_ALL_QUERY).then_some(StructuredQuery::MatchAll)
}

fn random_strategy(_: &QueryBuilder, q: &str, options: &SearchOptions) -> Option<StructuredQuery> {
    (q == RANDOM_QUERY && options.allow_random_query).then_some(StructuredQuery::RandomScore)
}

fn interval_strategy(
    builder: &QueryBuilder,
    q: &str,
    options: &SearchOptions,
) -> Option<StructuredQuery> {
    let mut interval = builder.intervals.parse(q)?;
    interval.assembly = assembly_override(q)
        .map(str::to_string)
        .or_else(|| builder.species_default_assembly(options));

    let position_field = builder.species.position_field(interval.assembly.as_deref());
    Some(StructuredQuery::RangeInterval {
        interval,
        position_field,
    })
}

fn query_string_strategy(_: &QueryBuilder, q: &str, _: &SearchOptions) -> Option<StructuredQuery> {
    let quoted = q.starts_with('"') && q.ends_with('"');
    let has_syntax = QUERY_STRING_TOKENS.iter().any(|token| q.contains(token));

    (quoted || has_syntax).then(|| StructuredQuery::QueryString {
        query: q.to_string(),
    })
}

fn wildcard_strategy(_: &QueryBuilder, q: &str, _: &SearchOptions) -> Option<StructuredQuery> {
    q.contains(['*', '?']).then(|| StructuredQuery::Wildcard {
        pattern: q.to_string(),
    })
}

fn default_strategy(_: &QueryBuilder, q: &str, _: &SearchOptions) -> Option<StructuredQuery> {
    Some(StructuredQuery::DefaultMultiMatch {
        text: q.to_string(),
    })
}

/// Builds gene search requests
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    translator: &'static DatasourceTranslator,
    intervals: &'static IntervalQueryParser,
    scoring: &'static ScoringPolicy,
    species: SpeciesCatalog,
    default_scopes: Vec<String>,
}

impl QueryBuilder {
    /// Create a builder over the built-in tables
    pub fn new() -> Self {
        Self {
            translator: DatasourceTranslator::global(),
            intervals: IntervalQueryParser::global(),
            scoring: ScoringPolicy::global(),
            species: SpeciesCatalog::builtin().clone(),
            default_scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Use a custom species catalog
    pub fn with_species(mut self, species: SpeciesCatalog) -> Self {
        self.species = species;
        self
    }

    /// Use custom default lookup scopes
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.default_scopes = scopes;
        }
        self
    }

    pub fn default_scopes(&self) -> &[String] {
        &self.default_scopes
    }

    /// Pick the base query for free text, returning the strategy that matched
    pub fn base_query(&self, q: &str, options: &SearchOptions) -> (QueryStrategy, StructuredQuery) {
        let (strategy, query) = FREE_TEXT_STRATEGIES
            .iter()
            .find_map(|(strategy, build)| build(self, q, options).map(|query| (*strategy, query)))
            .unwrap_or_else(|| {
                (
                    QueryStrategy::DefaultMultiMatch,
                    StructuredQuery::DefaultMultiMatch {
                        text: q.to_string(),
                    },
                )
            });
        tracing::debug!(?strategy, query = q, "selected free-text strategy");
        (strategy, query)
    }

    /// Build a free-text gene search
    pub fn build_free_text_query(
        &self,
        q: &str,
        options: &SearchOptions,
    ) -> Result<Search, QueryError> {
        let q = self.translator.translate_text(q);
        let (_, base) = self.base_query(&q, options);
        self.finish(base, options)
    }

    /// Build an identifier lookup over `scopes` (the defaults when empty)
    pub fn build_field_match_query<S: AsRef<str>>(
        &self,
        q: &str,
        scopes: &[S],
        options: &SearchOptions,
    ) -> Result<Search, QueryError> {
        let fields = if scopes.is_empty() {
            self.default_scopes.clone()
        } else {
            self.translator.translate_scopes(scopes)
        };
        tracing::debug!(query = q, ?fields, "building field match query");

        let base = StructuredQuery::FieldMatch {
            text: q.to_string(),
            fields,
        };
        self.finish(base, options)
    }

    fn finish(&self, base: StructuredQuery, options: &SearchOptions) -> Result<Search, QueryError> {
        let search = Search::new(self.scoring.apply(base));
        let search = FieldExistenceFilter::apply(search, options);
        SpeciesFilter::apply(search, options)
    }

    /// Default assembly when the species filter names exactly one known taxon
    fn species_default_assembly(&self, options: &SearchOptions) -> Option<String> {
        match SpeciesFilter::taxids(&options.species) {
            Ok(Some(taxids)) if taxids.len() == 1 => self
                .species
                .default_assembly(taxids[0])
                .map(str::to_string),
            _ => None,
        }
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Filter, FilterClause, IntervalQuery, ScoreMode};
    use serde_json::json;

    fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    fn strategy(q: &str, options: &SearchOptions) -> QueryStrategy {
        builder().base_query(q, options).0
    }

    /// The query under the scoring wrapper, asserting the wrapper is there
    fn scored_base(search: &Search) -> &StructuredQuery {
        match search.query.unfiltered() {
            StructuredQuery::FunctionScore {
                query, score_mode, ..
            } => {
                assert_eq!(*score_mode, ScoreMode::First);
                query
            }
            other => panic!("expected function score, got {other:?}"),
        }
    }

    #[test]
    fn test_strategy_order() {
        let options = SearchOptions::default();
        assert_eq!(strategy("__all__", &options), QueryStrategy::MatchAll);
        assert_eq!(strategy("chr1:1000-2000", &options), QueryStrategy::Interval);
        assert_eq!(strategy("\"cyclin dependent\"", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("symbol:cdk2", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("cdk2 AND taxid", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("cdk2 OR cdk3", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("NOT cdk2", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("cdk~", &options), QueryStrategy::QueryString);
        assert_eq!(strategy("cdk*", &options), QueryStrategy::Wildcard);
        assert_eq!(strategy("cdk?", &options), QueryStrategy::Wildcard);
        assert_eq!(strategy("cdk2", &options), QueryStrategy::DefaultMultiMatch);
    }

    #[test]
    fn test_interval_wins_over_query_string() {
        // Intervals contain ':' but are checked first
        assert_eq!(
            strategy("chr1:1,000-2,000", &SearchOptions::default()),
            QueryStrategy::Interval
        );
    }

    #[test]
    fn test_match_all_ignores_options() {
        let options = SearchOptions::new()
            .allow_random_query(true)
            .entrezonly(true);
        let search = builder().build_free_text_query("__all__", &options).unwrap();
        assert_eq!(scored_base(&search), &StructuredQuery::MatchAll);
    }

    #[test]
    fn test_random_query_requires_permission() {
        let allowed = SearchOptions::new().allow_random_query(true);
        assert_eq!(strategy("__any__", &allowed), QueryStrategy::RandomScore);

        let denied = SearchOptions::default();
        assert_eq!(strategy("__any__", &denied), QueryStrategy::DefaultMultiMatch);
    }

    #[test]
    fn test_interval_assembly_override() {
        let options = SearchOptions::default();
        let search = builder()
            .build_free_text_query("hg19.chr1:100-200", &options)
            .unwrap();

        assert_eq!(
            scored_base(&search),
            &StructuredQuery::RangeInterval {
                interval: IntervalQuery::new("1", 100, 200).assembly("hg19"),
                position_field: "genomic_pos_hg19".to_string(),
            }
        );

        let search = builder()
            .build_free_text_query("chr1:100-200", &options)
            .unwrap();
        assert_eq!(
            scored_base(&search),
            &StructuredQuery::RangeInterval {
                interval: IntervalQuery::new("1", 100, 200),
                position_field: "genomic_pos".to_string(),
            }
        );
    }

    #[test]
    fn test_interval_uses_single_species_default_assembly() {
        let options = SearchOptions::new().species(["10090"]);
        let search = builder()
            .build_free_text_query("chr7:1-2", &options)
            .unwrap();

        match scored_base(&search) {
            StructuredQuery::RangeInterval {
                interval,
                position_field,
            } => {
                assert_eq!(interval.assembly.as_deref(), Some("mm10"));
                assert_eq!(position_field, "genomic_pos");
            }
            other => panic!("expected interval, got {other:?}"),
        }

        let search = builder()
            .build_free_text_query("mm9.chr7:1-2", &options)
            .unwrap();
        match scored_base(&search) {
            StructuredQuery::RangeInterval { position_field, .. } => {
                assert_eq!(position_field, "genomic_pos_mm9");
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }

    #[test]
    fn test_free_text_translates_prefixes_before_dispatch() {
        let search = builder()
            .build_free_text_query("refseq:NM_000546", &SearchOptions::default())
            .unwrap();
        assert_eq!(
            scored_base(&search),
            &StructuredQuery::QueryString {
                query: "refseq_agg:NM_000546".to_string()
            }
        );

        let search = builder()
            .build_free_text_query("GO:0005634", &SearchOptions::default())
            .unwrap();
        assert_eq!(
            scored_base(&search),
            &StructuredQuery::QueryString {
                query: r"go.\*.id:go\:0005634".to_string()
            }
        );
    }

    #[test]
    fn test_query_string_wire_format() {
        let search = builder()
            .build_free_text_query("\"cyclin dependent kinase\"", &SearchOptions::default())
            .unwrap();
        assert_eq!(
            search.to_json()["query"]["function_score"]["query"],
            json!({
                "query_string": {
                    "query": "\"cyclin dependent kinase\"",
                    "default_operator": "AND",
                    "auto_generate_phrase_queries": true,
                }
            })
        );
    }

    #[test]
    fn test_field_match_default_scopes() {
        let search = builder()
            .build_field_match_query::<&str>("1017", &[], &SearchOptions::default())
            .unwrap();
        assert_eq!(
            scored_base(&search),
            &StructuredQuery::FieldMatch {
                text: "1017".to_string(),
                fields: vec![
                    "_id".to_string(),
                    "entrezgene".to_string(),
                    "ensembl.gene".to_string(),
                    "retired".to_string(),
                ],
            }
        );
    }

    #[test]
    fn test_custom_default_scopes() {
        let custom = builder().with_default_scopes(vec!["symbol".to_string()]);
        assert_eq!(custom.default_scopes(), ["symbol"]);

        let search = custom
            .build_field_match_query::<&str>("cdk2", &[], &SearchOptions::default())
            .unwrap();
        assert!(matches!(
            scored_base(&search),
            StructuredQuery::FieldMatch { fields, .. } if fields == &["symbol"]
        ));

        // An empty list keeps the built-in scopes
        let unchanged = builder().with_default_scopes(Vec::new());
        assert_eq!(unchanged.default_scopes(), DEFAULT_SCOPES);
    }

    #[test]
    fn test_default_strategy_is_last() {
        let (last, _) = FREE_TEXT_STRATEGIES[FREE_TEXT_STRATEGIES.len() - 1];
        assert_eq!(last, QueryStrategy::DefaultMultiMatch);
        assert_eq!(strategy("", &SearchOptions::default()), QueryStrategy::DefaultMultiMatch);
    }

    #[test]
    fn test_field_match_translates_scopes() {
        let search = builder()
            .build_field_match_query("NM_000546", &["refseq", "refseq.rna", "reporter"], &SearchOptions::default())
            .unwrap();
        assert_eq!(
            search.to_json()["query"]["function_score"]["query"],
            json!({
                "multi_match": {
                    "query": "NM_000546",
                    "fields": ["refseq_agg", "refseq.rna", "reporter.*"],
                    "operator": "and",
                    "lenient": true,
                }
            })
        );
    }

    #[test]
    fn test_filters_run_for_both_paths() {
        let options = SearchOptions::new()
            .entrezonly(true)
            .species(["9606"]);
        let expected = vec![
            FilterClause::Require(Filter::exists("entrezgene")),
            FilterClause::Require(Filter::terms("taxid", [9606u64])),
        ];

        let free_text = builder().build_free_text_query("cdk2", &options).unwrap();
        assert_eq!(free_text.query.clauses(), expected.as_slice());

        let lookup = builder()
            .build_field_match_query("1017", &["entrezgene"], &options)
            .unwrap();
        assert_eq!(lookup.query.clauses(), expected.as_slice());
    }

    #[test]
    fn test_invalid_species_fails_build() {
        let options = SearchOptions::new().species(["human"]);
        let err = builder().build_free_text_query("cdk2", &options).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidInput("cannot map some species to taxids.".to_string())
        );
    }

    #[test]
    fn test_full_request_body() {
        let options = SearchOptions::new()
            .species(["9606", "10090"])
            .missing(["retired"])
            .aggs(true)
            .species_facet_filter(["10090"]);
        let body = builder()
            .build_free_text_query("cdk2", &options)
            .unwrap()
            .to_json();

        assert_eq!(body["query"]["bool"]["filter"], json!([{ "terms": { "taxid": [9606, 10090] } }]));
        assert_eq!(body["query"]["bool"]["must_not"], json!([{ "exists": { "field": "retired" } }]));
        assert_eq!(body["query"]["bool"]["must"]["function_score"]["score_mode"], json!("first"));
        assert_eq!(body["post_filter"], json!({ "terms": { "taxid": [10090] } }));
    }
}
