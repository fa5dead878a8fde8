//! Taxonomy reference data.

use serde::{Deserialize, Serialize};

/// A taxon from the taxonomy reference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonNode {
    /// NCBI taxon id
    pub taxid: u64,

    /// Whether at least one gene record belongs to this taxon
    #[serde(default)]
    pub has_gene: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_taxid: Option<u64>,

    /// Ancestor chain, including the taxon itself
    #[serde(default)]
    pub lineage: Vec<u64>,

    /// Descendant taxon ids, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<u64>>,
}

impl TaxonNode {
    pub fn new(taxid: u64) -> Self {
        Self {
            taxid,
            has_gene: false,
            scientific_name: None,
            common_name: None,
            rank: None,
            parent_taxid: None,
            lineage: vec![taxid],
            children: None,
        }
    }

    /// Set whether the taxon has genes
    pub fn has_gene(mut self, has_gene: bool) -> Self {
        self.has_gene = has_gene;
        self
    }

    /// Set the scientific name
    pub fn scientific_name(mut self, name: impl Into<String>) -> Self {
        self.scientific_name = Some(name.into());
        self
    }

    /// Set the common name
    pub fn common_name(mut self, name: impl Into<String>) -> Self {
        self.common_name = Some(name.into());
        self
    }

    /// Set the rank
    pub fn rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    /// Set the ancestor chain, from the root down to the parent.
    ///
    /// The taxon itself is appended, and the last ancestor becomes the parent.
    pub fn ancestors(mut self, ancestors: impl IntoIterator<Item = u64>) -> Self {
        let mut lineage: Vec<u64> = ancestors.into_iter().collect();
        self.parent_taxid = lineage.last().copied();
        lineage.push(self.taxid);
        self.lineage = lineage;
        self
    }

    /// Whether `taxid` appears in this taxon's lineage
    pub fn descends_from(&self, taxid: u64) -> bool {
        self.lineage.contains(&taxid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestors_sets_parent_and_lineage() {
        let node = TaxonNode::new(9606).ancestors([1, 9604, 9605]);
        assert_eq!(node.parent_taxid, Some(9605));
        assert_eq!(node.lineage, vec![1, 9604, 9605, 9606]);
        assert!(node.descends_from(9604));
        assert!(node.descends_from(9606));
        assert!(!node.descends_from(10090));
    }

    #[test]
    fn test_children_omitted_when_absent() {
        let json = serde_json::to_value(TaxonNode::new(9606)).unwrap();
        assert!(json.get("children").is_none());
        assert_eq!(json["lineage"], serde_json::json!([9606]));
    }
}
