//! Taxonomy store backed by a search-engine index over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::config::TaxonomyConfig;
use crate::models::TaxonNode;
use crate::taxonomy::{TaxonomyError, TaxonomyStore};
use crate::utils::HttpClient;

/// Taxonomy index reached through the engine's document and search APIs.
///
/// Each call is a single request on a shared connection pool; the store
/// keeps no cursor or session state, so one instance serves concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct EsTaxonomyStore {
    client: HttpClient,
    base_url: Url,
    index: String,
}

impl EsTaxonomyStore {
    /// Create a store from configuration
    pub fn new(config: &TaxonomyConfig) -> Result<Self, TaxonomyError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_seconds))?;
        Self::with_client(client, &config.host, &config.index)
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(
        client: HttpClient,
        host: &str,
        index: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let mut base_url = Url::parse(host)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            index: index.into(),
        })
    }

    fn doc_url(&self, taxid: u64) -> Result<Url, TaxonomyError> {
        Ok(self.base_url.join(&format!("{}/_doc/{}", self.index, taxid))?)
    }

    fn search_url(&self) -> Result<Url, TaxonomyError> {
        Ok(self.base_url.join(&format!("{}/_search", self.index))?)
    }

    /// Query-string expression selecting the descendants of `taxid`
    fn lineage_query(taxid: u64, has_gene: bool) -> String {
        if has_gene {
            format!("lineage:{} AND has_gene:true", taxid)
        } else {
            format!("lineage:{}", taxid)
        }
    }
}

#[async_trait]
impl TaxonomyStore for EsTaxonomyStore {
    async fn get_taxon(&self, taxid: u64) -> Result<Option<TaxonNode>, TaxonomyError> {
        let url = self.doc_url(taxid)?;
        tracing::debug!(%url, "fetching taxon");

        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| TaxonomyError::Network(format!("Failed to fetch taxon: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TaxonomyError::Api(format!(
                "taxonomy store returned {} for taxon {}",
                response.status(),
                taxid
            )));
        }

        let doc: GetResponse = response
            .json()
            .await
            .map_err(|e| TaxonomyError::Parse(format!("Failed to parse taxon JSON: {}", e)))?;

        if !doc.found {
            return Ok(None);
        }
        Ok(doc.source.map(|source| source.into_node(taxid)))
    }

    async fn lineage_members(
        &self,
        taxid: u64,
        has_gene: bool,
        size: usize,
    ) -> Result<Vec<u64>, TaxonomyError> {
        let url = self.search_url()?;
        let body = json!({
            "query": { "query_string": { "query": Self::lineage_query(taxid, has_gene) } },
            "_source": false,
            "size": size,
        });
        tracing::debug!(%url, taxid, has_gene, size, "searching taxonomy lineage");

        let response = self
            .client
            .client()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TaxonomyError::Network(format!("Failed to search taxonomy: {}", e)))?;

        if !response.status().is_success() {
            return Err(TaxonomyError::Api(format!(
                "taxonomy store returned {} for lineage of {}",
                response.status(),
                taxid
            )));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| TaxonomyError::Parse(format!("Failed to parse search JSON: {}", e)))?;

        Ok(data
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| match hit.id.parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(id = %hit.id, "skipping taxonomy hit with non-numeric id");
                    None
                }
            })
            .collect())
    }
}

// ===== Engine API Types =====

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<TaxonSource>,
}

#[derive(Debug, Deserialize)]
struct TaxonSource {
    taxid: Option<u64>,
    #[serde(default)]
    has_gene: bool,
    scientific_name: Option<String>,
    common_name: Option<String>,
    rank: Option<String>,
    parent_taxid: Option<u64>,
    #[serde(default)]
    lineage: Vec<u64>,
}

impl TaxonSource {
    fn into_node(self, requested: u64) -> TaxonNode {
        TaxonNode {
            taxid: self.taxid.unwrap_or(requested),
            has_gene: self.has_gene,
            scientific_name: self.scientific_name,
            common_name: self.common_name,
            rank: self.rank,
            parent_taxid: self.parent_taxid,
            lineage: self.lineage,
            children: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
}
