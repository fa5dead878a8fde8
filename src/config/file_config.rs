//! Configuration file support for mygene-query.
//!
//! # Configuration File Format
//!
//! ```toml
//! [taxonomy]
//! host = "http://localhost:9200"
//! index = "taxonomy"
//! result_size = 1000
//! max_expanded = 1000
//! timeout_seconds = 30
//!
//! [query]
//! default_scopes = ["_id", "entrezgene", "ensembl.gene", "retired"]
//! allow_random_query = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [[species]]
//! name = "human"
//! taxid = 9606
//! assembly = "hg38"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Config, LoggingConfig, QueryConfig, TaxonomyConfig};
use crate::models::{default_species, SpeciesInfo};

/// File name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "mygene-query.toml";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_species")]
    pub species: Vec<SpeciesInfo>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::from(Config::default())
    }
}

impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        Self {
            taxonomy: config.taxonomy,
            query: config.query,
            logging: config.logging,
            species: config.species,
        }
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            taxonomy: file.taxonomy,
            query: file.query,
            logging: file.logging,
            species: file.species,
        }
    }
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("mygene-query").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[taxonomy]
host = "http://taxonomy:9200"
index = "taxonomy_20240101"
max_expanded = 250

[query]
allow_random_query = true

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.taxonomy.host, "http://taxonomy:9200");
        assert_eq!(config.taxonomy.index, "taxonomy_20240101");
        assert_eq!(config.taxonomy.max_expanded, 250);
        assert_eq!(config.taxonomy.result_size, 1000);
        assert!(config.query.allow_random_query);
        assert_eq!(config.query.default_scopes.len(), 4);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.species, default_species());
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ConfigFile::default();
        config.taxonomy.index = "saved-index".to_string();
        config.species.truncate(2);

        config.save(&path).unwrap();

        let loaded = Config::from(ConfigFile::load(&path).unwrap());
        assert_eq!(loaded.taxonomy.index, "saved-index");
        assert_eq!(loaded.species.len(), 2);
        assert_eq!(loaded.species_catalog().default_assembly(10090), Some("mm10"));
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/mygene-query.toml");
        assert!(matches!(
            ConfigFile::load(&path),
            Err(ConfigFileError::Io(_))
        ));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(matches!(
            ConfigFile::load(&path),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
