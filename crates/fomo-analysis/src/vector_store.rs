//! Pinecone data-plane client for retrieving indexed news content.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::http::{build_client, ensure_success, read_json};
use crate::types::{AnalysisConfig, NewsMatch};

/// Pinecone index client. Talks to the index host directly.
pub struct VectorIndexClient {
    client: Client,
    host: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<NewsMatch>,
}

impl VectorIndexClient {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let host = config.pinecone_index_host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Ok(Self {
            client: build_client(config.request_timeout_secs)?,
            host,
            api_key: config.pinecone_api_key.clone(),
        })
    }

    /// Semantic search restricted to the given news ids.
    ///
    /// Returns matches in the order the index ranked them. An empty id list
    /// short-circuits to no matches without calling the index.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Status`] on a non-2xx answer or
    /// [`AnalysisError::Deserialize`] on an unexpected body.
    pub async fn query(
        &self,
        vector: &[f32],
        news_ids: &[String],
        top_k: usize,
    ) -> Result<Vec<NewsMatch>, AnalysisError> {
        if news_ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            filter: serde_json::json!({ "news_id": { "$in": news_ids } }),
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success("pinecone query", response).await?;
        let parsed: QueryResponse = read_json("pinecone query", response).await?;

        tracing::debug!(
            requested_ids = news_ids.len(),
            matches = parsed.matches.len(),
            "vector index queried"
        );
        Ok(parsed.matches)
    }

    /// Fetch index statistics; used as a connectivity probe.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the index is unreachable or rejects the key.
    pub async fn describe_index_stats(&self) -> Result<serde_json::Value, AnalysisError> {
        let response = self
            .client
            .post(format!("{}/describe_index_stats", self.host))
            .header("Api-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let response = ensure_success("pinecone describe_index_stats", response).await?;
        read_json("pinecone describe_index_stats", response).await
    }
}
