//! Structured search-engine query tree.
//!
//! Queries are built bottom-up and never mutated in place: every combinator
//! consumes `self` and returns a new value. The tree is turned into the
//! engine's JSON query language by [`StructuredQuery::to_json`], and a whole
//! request body by [`Search::to_json`].

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Fields searched by the default relevance query, with their boosts.
const DISMAX_FIELDS: &[(&str, f64)] = &[
    ("symbol", 5.0),
    ("alias", 2.0),
    ("name", 1.0),
    ("other_names", 0.5),
    ("summary", 0.1),
];

/// Fields searched by the wildcard query, with their boosts.
const WILDCARD_FIELDS: &[(&str, f64)] = &[
    ("symbol", 5.0),
    ("alias", 1.5),
    ("name", 1.0),
    ("summary", 0.1),
];

/// A genomic coordinate range, e.g. `chr1:1000-2000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalQuery {
    /// Chromosome name without the `chr` prefix
    pub chrom: String,

    /// Range start (inclusive)
    pub start: u64,

    /// Range end (inclusive)
    pub end: u64,

    /// Genome build; `None` means the species default
    pub assembly: Option<String>,
}

impl IntervalQuery {
    /// Create a new interval on the default assembly
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            assembly: None,
        }
    }

    /// Set the assembly
    pub fn assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }
}

/// A non-scoring filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals a single value
    Term { field: String, value: Value },

    /// Field equals any of the values
    Terms { field: String, values: Vec<Value> },

    /// Field is present on the document
    Exists { field: String },
}

impl Filter {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Filter::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists {
            field: field.into(),
        }
    }

    /// Evaluate the filter against a flat or nested JSON document.
    ///
    /// Dotted field names (`ensembl.gene`) walk into nested objects.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Term { field, value } => lookup(doc, field).is_some_and(|v| v == value),
            Filter::Terms { field, values } => {
                lookup(doc, field).is_some_and(|v| values.iter().any(|candidate| candidate == v))
            }
            Filter::Exists { field } => lookup(doc, field).is_some_and(|v| !v.is_null()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Filter::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Filter::Exists { field } => json!({ "exists": { "field": field } }),
        }
    }
}

fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(doc, |current, segment| current.get(segment))
}

/// A filter clause attached to a [`StructuredQuery::Filtered`] node.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Documents must match the filter
    Require(Filter),

    /// Documents matching the filter are dropped
    Exclude(Filter),
}

/// One weighting rule of a function-score query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreFunction {
    pub filter: Filter,
    pub weight: f64,
}

impl ScoreFunction {
    pub fn new(filter: Filter, weight: f64) -> Self {
        Self { filter, weight }
    }
}

/// How the engine combines function-score rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Only the first matching rule applies
    First,
}

impl ScoreMode {
    fn as_str(self) -> &'static str {
        match self {
            ScoreMode::First => "first",
        }
    }
}

/// Immutable query tree handed to the search engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredQuery {
    /// Matches every document
    MatchAll,

    /// Matches every document with a random score
    RandomScore,

    /// Genes overlapping a genomic range
    RangeInterval {
        interval: IntervalQuery,
        /// Genomic position field for the requested assembly
        position_field: String,
    },

    /// Lucene query-string syntax
    QueryString { query: String },

    /// Wildcard match over the gene name fields
    Wildcard { pattern: String },

    /// Disjunction-max relevance query over fixed fields
    DefaultMultiMatch { text: String },

    /// Identifier lookup restricted to explicit fields
    FieldMatch { text: String, fields: Vec<String> },

    /// Base query re-weighted by ordered rules
    FunctionScore {
        query: Box<StructuredQuery>,
        functions: Vec<ScoreFunction>,
        score_mode: ScoreMode,
    },

    /// Base query restricted by filter clauses
    Filtered {
        query: Box<StructuredQuery>,
        clauses: Vec<FilterClause>,
    },
}

impl StructuredQuery {
    /// Add a required filter, returning the new query
    pub fn filter(self, filter: Filter) -> Self {
        self.with_clause(FilterClause::Require(filter))
    }

    /// Add an exclusion filter, returning the new query
    pub fn exclude(self, filter: Filter) -> Self {
        self.with_clause(FilterClause::Exclude(filter))
    }

    fn with_clause(self, clause: FilterClause) -> Self {
        match self {
            StructuredQuery::Filtered { query, mut clauses } => {
                clauses.push(clause);
                StructuredQuery::Filtered { query, clauses }
            }
            base => StructuredQuery::Filtered {
                query: Box::new(base),
                clauses: vec![clause],
            },
        }
    }

    /// Filter clauses of this node, empty when it is not filtered
    pub fn clauses(&self) -> &[FilterClause] {
        match self {
            StructuredQuery::Filtered { clauses, .. } => clauses,
            _ => &[],
        }
    }

    /// The scoring query underneath any filter layer
    pub fn unfiltered(&self) -> &StructuredQuery {
        match self {
            StructuredQuery::Filtered { query, .. } => query.unfiltered(),
            other => other,
        }
    }

    /// Serialize to the engine's query language
    pub fn to_json(&self) -> Value {
        match self {
            StructuredQuery::MatchAll => json!({ "match_all": {} }),
            StructuredQuery::RandomScore => json!({ "function_score": { "random_score": {} } }),
            StructuredQuery::RangeInterval {
                interval,
                position_field,
            } => json!({
                "bool": {
                    "filter": [
                        { "term": { format!("{}.chr", position_field): interval.chrom } },
                        { "range": { format!("{}.start", position_field): { "lte": interval.end } } },
                        { "range": { format!("{}.end", position_field): { "gte": interval.start } } },
                    ]
                }
            }),
            StructuredQuery::QueryString { query } => json!({
                "query_string": {
                    "query": query,
                    "default_operator": "AND",
                    "auto_generate_phrase_queries": true,
                }
            }),
            StructuredQuery::Wildcard { pattern } => {
                let pattern = pattern.to_lowercase();
                let should: Vec<Value> = WILDCARD_FIELDS
                    .iter()
                    .map(|(field, boost)| {
                        json!({ "wildcard": { *field: { "value": pattern, "boost": boost } } })
                    })
                    .collect();
                json!({ "bool": { "should": should } })
            }
            StructuredQuery::DefaultMultiMatch { text } => {
                let mut queries = Vec::with_capacity(DISMAX_FIELDS.len() + 1);
                // Bare numbers are most likely Entrez ids
                if let Ok(id) = text.parse::<u64>() {
                    queries.push(json!({ "term": { "entrezgene": { "value": id, "boost": 10.0 } } }));
                }
                queries.extend(DISMAX_FIELDS.iter().map(|(field, boost)| {
                    json!({ "match": { *field: { "query": text, "operator": "and", "boost": boost } } })
                }));
                json!({ "dis_max": { "tie_breaker": 0, "boost": 1, "queries": queries } })
            }
            StructuredQuery::FieldMatch { text, fields } => json!({
                "multi_match": {
                    "query": text,
                    "fields": fields,
                    "operator": "and",
                    "lenient": true,
                }
            }),
            StructuredQuery::FunctionScore {
                query,
                functions,
                score_mode,
            } => {
                let functions: Vec<Value> = functions
                    .iter()
                    .map(|f| json!({ "filter": f.filter.to_json(), "weight": f.weight }))
                    .collect();
                json!({
                    "function_score": {
                        "query": query.to_json(),
                        "functions": functions,
                        "score_mode": score_mode.as_str(),
                    }
                })
            }
            StructuredQuery::Filtered { query, clauses } => {
                let mut body = Map::new();
                body.insert("must".to_string(), query.to_json());

                let required: Vec<Value> = clauses
                    .iter()
                    .filter_map(|c| match c {
                        FilterClause::Require(f) => Some(f.to_json()),
                        FilterClause::Exclude(_) => None,
                    })
                    .collect();
                let excluded: Vec<Value> = clauses
                    .iter()
                    .filter_map(|c| match c {
                        FilterClause::Exclude(f) => Some(f.to_json()),
                        FilterClause::Require(_) => None,
                    })
                    .collect();

                if !required.is_empty() {
                    body.insert("filter".to_string(), Value::Array(required));
                }
                if !excluded.is_empty() {
                    body.insert("must_not".to_string(), Value::Array(excluded));
                }
                json!({ "bool": body })
            }
        }
    }
}

impl Serialize for StructuredQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A complete search request: the query plus an optional post-filter.
///
/// The post-filter narrows returned hits after aggregations are computed,
/// so facet counts are unaffected by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub query: StructuredQuery,
    pub post_filter: Option<Filter>,
}

impl Search {
    pub fn new(query: StructuredQuery) -> Self {
        Self {
            query,
            post_filter: None,
        }
    }

    /// Replace the query, keeping the post-filter
    pub fn map_query(self, f: impl FnOnce(StructuredQuery) -> StructuredQuery) -> Self {
        Self {
            query: f(self.query),
            post_filter: self.post_filter,
        }
    }

    /// Set the post-filter
    pub fn post_filter(mut self, filter: Filter) -> Self {
        self.post_filter = Some(filter);
        self
    }

    /// Serialize to a request body
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_json());
        if let Some(filter) = &self.post_filter {
            body.insert("post_filter".to_string(), filter.to_json());
        }
        Value::Object(body)
    }
}

impl Serialize for Search {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_chaining_builds_single_layer() {
        let query = StructuredQuery::MatchAll
            .filter(Filter::exists("entrezgene"))
            .exclude(Filter::exists("retired"))
            .filter(Filter::terms("taxid", [9606u64]));

        assert_eq!(query.clauses().len(), 3);
        assert_eq!(query.unfiltered(), &StructuredQuery::MatchAll);
    }

    #[test]
    fn test_filtered_to_json_splits_clauses() {
        let query = StructuredQuery::MatchAll
            .filter(Filter::exists("entrezgene"))
            .exclude(Filter::exists("retired"));

        assert_eq!(
            query.to_json(),
            json!({
                "bool": {
                    "must": { "match_all": {} },
                    "filter": [{ "exists": { "field": "entrezgene" } }],
                    "must_not": [{ "exists": { "field": "retired" } }],
                }
            })
        );
    }

    #[test]
    fn test_range_interval_to_json() {
        let query = StructuredQuery::RangeInterval {
            interval: IntervalQuery::new("1", 1000, 2000),
            position_field: "genomic_pos".to_string(),
        };

        assert_eq!(
            query.to_json(),
            json!({
                "bool": {
                    "filter": [
                        { "term": { "genomic_pos.chr": "1" } },
                        { "range": { "genomic_pos.start": { "lte": 2000 } } },
                        { "range": { "genomic_pos.end": { "gte": 1000 } } },
                    ]
                }
            })
        );
    }

    #[test]
    fn test_default_multi_match_adds_entrez_term_for_numbers() {
        let numeric = StructuredQuery::DefaultMultiMatch {
            text: "1017".to_string(),
        }
        .to_json();
        let queries = numeric["dis_max"]["queries"].as_array().unwrap();
        assert_eq!(queries.len(), DISMAX_FIELDS.len() + 1);
        assert_eq!(queries[0]["term"]["entrezgene"]["value"], json!(1017));

        let text = StructuredQuery::DefaultMultiMatch {
            text: "cdk2".to_string(),
        }
        .to_json();
        assert_eq!(
            text["dis_max"]["queries"].as_array().unwrap().len(),
            DISMAX_FIELDS.len()
        );
    }

    #[test]
    fn test_filter_matches_nested_fields() {
        let doc = json!({ "taxid": 9606, "ensembl": { "gene": "ENSG00000123374" } });

        assert!(Filter::term("taxid", 9606).matches(&doc));
        assert!(!Filter::term("taxid", 10090).matches(&doc));
        assert!(Filter::terms("taxid", [10090, 9606]).matches(&doc));
        assert!(Filter::exists("ensembl.gene").matches(&doc));
        assert!(!Filter::exists("entrezgene").matches(&doc));
    }

    #[test]
    fn test_search_post_filter_serialization() {
        let search = Search::new(StructuredQuery::MatchAll);
        assert!(search.to_json().get("post_filter").is_none());

        let search = search.post_filter(Filter::terms("taxid", [10090u64]));
        assert_eq!(
            search.to_json()["post_filter"],
            json!({ "terms": { "taxid": [10090] } })
        );
    }
}
