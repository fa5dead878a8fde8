//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, ConfigFile, ConfigFileError, CONFIG_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{default_species, SpeciesCatalog, SpeciesInfo};
use crate::query::DEFAULT_SCOPES;
use crate::taxonomy::{DEFAULT_MAX_EXPANDED, DEFAULT_RESULT_SIZE};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MYGENE_QUERY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Taxonomy store settings
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Query building settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Species known by common name
    #[serde(default = "default_species")]
    pub species: Vec<SpeciesInfo>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            taxonomy: TaxonomyConfig::default(),
            query: QueryConfig::default(),
            logging: LoggingConfig::default(),
            species: default_species(),
        }
    }
}

impl Config {
    /// Species catalog built from the configured species
    pub fn species_catalog(&self) -> SpeciesCatalog {
        SpeciesCatalog::new(self.species.clone())
    }
}

/// Taxonomy store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Base URL of the search engine holding the taxonomy index
    #[serde(default = "default_host")]
    pub host: String,

    /// Taxonomy index name
    #[serde(default = "default_index")]
    pub index: String,

    /// Maximum descendants returned per lineage query
    #[serde(default = "default_result_size")]
    pub result_size: usize,

    /// Maximum size of an expanded species list
    #[serde(default = "default_max_expanded")]
    pub max_expanded: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            index: default_index(),
            result_size: default_result_size(),
            max_expanded: default_max_expanded(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "taxonomy".to_string()
}

fn default_result_size() -> usize {
    DEFAULT_RESULT_SIZE
}

fn default_max_expanded() -> usize {
    DEFAULT_MAX_EXPANDED
}

fn default_timeout() -> u64 {
    30
}

/// Query building configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Fields searched by identifier lookups without explicit scopes
    #[serde(default = "default_scopes")]
    pub default_scopes: Vec<String>,

    /// Whether `__any__` may return random documents
    #[serde(default)]
    pub allow_random_query: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_scopes: default_scopes(),
            allow_random_query: false,
        }
    }
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, plain text otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with `MYGENE_QUERY__*` environment overrides
pub fn load_config(path: &Path) -> Result<Config, ::config::ConfigError> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
