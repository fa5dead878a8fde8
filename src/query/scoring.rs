//! Relevance weighting applied to every gene query.

use serde_json::Value;
use std::sync::OnceLock;

use crate::models::{Filter, ScoreFunction, ScoreMode, StructuredQuery};

/// Ordered first-match weighting rules.
///
/// Pseudogenes are down-weighted ahead of the model-organism boosts, so a
/// human pseudogene scores 0.5 and not 1.55.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    rules: Vec<ScoreFunction>,
}

impl ScoringPolicy {
    pub fn new(rules: Vec<ScoreFunction>) -> Self {
        Self { rules }
    }

    /// Gene relevance rules: pseudogenes down, human, mouse and rat up
    pub fn gene_relevance() -> Self {
        Self::new(vec![
            ScoreFunction::new(Filter::term("name", "pseudogene"), 0.5),
            ScoreFunction::new(Filter::term("taxid", 9606), 1.55),
            ScoreFunction::new(Filter::term("taxid", 10090), 1.3),
            ScoreFunction::new(Filter::term("taxid", 10116), 1.1),
        ])
    }

    /// Process-wide gene relevance policy
    pub fn global() -> &'static ScoringPolicy {
        static POLICY: OnceLock<ScoringPolicy> = OnceLock::new();
        POLICY.get_or_init(ScoringPolicy::gene_relevance)
    }

    pub fn rules(&self) -> &[ScoreFunction] {
        &self.rules
    }

    /// Wrap `base` in a first-match function score
    pub fn apply(&self, base: StructuredQuery) -> StructuredQuery {
        StructuredQuery::FunctionScore {
            query: Box::new(base),
            functions: self.rules.clone(),
            score_mode: ScoreMode::First,
        }
    }

    /// Weight the engine would give `doc`: the first matching rule, else 1.0
    pub fn weight_for(&self, doc: &Value) -> f64 {
        self.rules
            .iter()
            .find(|rule| rule.filter.matches(doc))
            .map_or(1.0, |rule| rule.weight)
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::gene_relevance()
    }
}
