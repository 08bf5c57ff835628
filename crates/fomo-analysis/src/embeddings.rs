//! Gemini embedding client used to vectorise the company query.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::http::{build_client, ensure_success, read_json};
use crate::types::AnalysisConfig;

/// Gemini `embedContent` client.
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Embedding,
}

#[derive(Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

impl EmbeddingClient {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: build_client(config.request_timeout_secs)?,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.google_api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
        })
    }

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Status`] on a non-2xx answer,
    /// [`AnalysisError::Deserialize`] on an unexpected body, or
    /// [`AnalysisError::Embedding`] if the vector is empty or has the wrong
    /// dimension.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        let url = format!("{}/models/{}:embedContent", self.base_url, self.model);
        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
            output_dimensionality: self.dimensions,
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;
        let response = ensure_success("gemini embedContent", response).await?;
        let parsed: EmbedContentResponse = read_json("embedContent", response).await?;
        let values = parsed.embedding.values;

        if values.is_empty() {
            return Err(AnalysisError::Embedding("empty embedding returned".into()));
        }
        if values.len() != self.dimensions {
            return Err(AnalysisError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                values.len()
            )));
        }

        tracing::debug!(model = %self.model, dimensions = values.len(), "query embedded");
        Ok(values)
    }
}
