//! Common species names, taxon ids and default genome assemblies.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Base name of the genomic position fields for each species' default build
pub const DEFAULT_POSITION_FIELD: &str = "genomic_pos";

/// A species known by common name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    /// Common name, matched case-insensitively
    pub name: String,

    /// NCBI taxon id
    pub taxid: u64,

    /// Default genome assembly, if genomic positions are indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
}

impl SpeciesInfo {
    pub fn new(name: impl Into<String>, taxid: u64, assembly: Option<&str>) -> Self {
        Self {
            name: name.into(),
            taxid,
            assembly: assembly.map(str::to_string),
        }
    }
}

/// The species shipped with the service
pub fn default_species() -> Vec<SpeciesInfo> {
    vec![
        SpeciesInfo::new("human", 9606, Some("hg38")),
        SpeciesInfo::new("mouse", 10090, Some("mm10")),
        SpeciesInfo::new("rat", 10116, Some("rn4")),
        SpeciesInfo::new("fruitfly", 7227, Some("dm3")),
        SpeciesInfo::new("nematode", 6239, Some("ce10")),
        SpeciesInfo::new("zebrafish", 7955, Some("zv9")),
        SpeciesInfo::new("thale-cress", 3702, None),
        SpeciesInfo::new("frog", 8364, Some("xenTro3")),
        SpeciesInfo::new("pig", 9823, Some("susScr2")),
    ]
}

/// Immutable lookup table over [`SpeciesInfo`] entries
#[derive(Debug, Clone)]
pub struct SpeciesCatalog {
    entries: Vec<SpeciesInfo>,
}

impl SpeciesCatalog {
    pub fn new(entries: Vec<SpeciesInfo>) -> Self {
        Self { entries }
    }

    /// Process-wide catalog of the default species
    pub fn builtin() -> &'static SpeciesCatalog {
        static CATALOG: OnceLock<SpeciesCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| SpeciesCatalog::new(default_species()))
    }

    pub fn entries(&self) -> &[SpeciesInfo] {
        &self.entries
    }

    /// Taxon id for a common name
    pub fn taxid_for_name(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.taxid)
    }

    /// Default assembly of a taxon
    pub fn default_assembly(&self, taxid: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|s| s.taxid == taxid)
            .and_then(|s| s.assembly.as_deref())
    }

    /// Genomic position field holding coordinates for `assembly`.
    ///
    /// Default builds live in `genomic_pos`; alternate builds such as
    /// `hg19` live in `genomic_pos_hg19`.
    pub fn position_field(&self, assembly: Option<&str>) -> String {
        match assembly {
            Some(a) if !self.is_default_assembly(a) => format!("{}_{}", DEFAULT_POSITION_FIELD, a),
            _ => DEFAULT_POSITION_FIELD.to_string(),
        }
    }

    fn is_default_assembly(&self, assembly: &str) -> bool {
        self.entries
            .iter()
            .any(|s| s.assembly.as_deref() == Some(assembly))
    }
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        Self::new(default_species())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxid_for_name_is_case_insensitive() {
        let catalog = SpeciesCatalog::builtin();
        assert_eq!(catalog.taxid_for_name("human"), Some(9606));
        assert_eq!(catalog.taxid_for_name("Thale-Cress"), Some(3702));
        assert_eq!(catalog.taxid_for_name("9606"), None);
    }

    #[test]
    fn test_builtin_entries() {
        let entries = SpeciesCatalog::builtin().entries();
        assert_eq!(entries.len(), 9);
        assert_eq!(entries[0], SpeciesInfo::new("human", 9606, Some("hg38")));
        assert!(entries.iter().any(|s| s.name == "thale-cress" && s.assembly.is_none()));
    }

    #[test]
    fn test_default_assembly() {
        let catalog = SpeciesCatalog::builtin();
        assert_eq!(catalog.default_assembly(9606), Some("hg38"));
        assert_eq!(catalog.default_assembly(10090), Some("mm10"));
        assert_eq!(catalog.default_assembly(3702), None);
        assert_eq!(catalog.default_assembly(1), None);
    }

    #[test]
    fn test_position_field() {
        let catalog = SpeciesCatalog::builtin();
        assert_eq!(catalog.position_field(None), "genomic_pos");
        assert_eq!(catalog.position_field(Some("hg38")), "genomic_pos");
        assert_eq!(catalog.position_field(Some("hg19")), "genomic_pos_hg19");
        assert_eq!(catalog.position_field(Some("mm9")), "genomic_pos_mm9");
    }
}
