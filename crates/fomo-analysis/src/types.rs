use serde::Deserialize;
use serde_json::{Map, Value};

/// Connection and model settings for the analysis pipeline.
#[derive(Clone)]
pub struct AnalysisConfig {
    pub gemini_base_url: String,
    pub google_api_key: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub embedding_dim: usize,
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub search_top_k: usize,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("gemini_base_url", &self.gemini_base_url)
            .field("google_api_key", &"[redacted]")
            .field("embedding_model", &self.embedding_model)
            .field("generation_model", &self.generation_model)
            .field("embedding_dim", &self.embedding_dim)
            .field("pinecone_api_key", &"[redacted]")
            .field("pinecone_index_host", &self.pinecone_index_host)
            .field("search_top_k", &self.search_top_k)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_ms", &self.llm_retry_backoff_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Build the pipeline config from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AnalysisError::Config`] listing every missing
    /// credential or endpoint.
    pub fn from_app_config(config: &fomo_core::AppConfig) -> Result<Self, crate::AnalysisError> {
        let mut missing = Vec::new();
        if config.google_api_key.is_none() {
            missing.push("GOOGLE_API_KEY");
        }
        if config.pinecone_api_key.is_none() {
            missing.push("PINECONE_API_KEY");
        }
        if config.pinecone_index_host.is_none() {
            missing.push("PINECONE_INDEX_HOST");
        }

        match (
            &config.google_api_key,
            &config.pinecone_api_key,
            &config.pinecone_index_host,
        ) {
            (Some(google_api_key), Some(pinecone_api_key), Some(pinecone_index_host)) => Ok(Self {
                gemini_base_url: config.gemini_base_url.clone(),
                google_api_key: google_api_key.clone(),
                embedding_model: config.embedding_model.clone(),
                generation_model: config.generation_model.clone(),
                embedding_dim: config.embedding_dim,
                pinecone_api_key: pinecone_api_key.clone(),
                pinecone_index_host: pinecone_index_host.clone(),
                search_top_k: config.search_top_k,
                llm_max_retries: config.llm_max_retries,
                llm_retry_backoff_ms: config.llm_retry_backoff_ms,
                request_timeout_secs: config.request_timeout_secs,
            }),
            _ => Err(crate::AnalysisError::Config(format!(
                "missing analysis env vars: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// One match returned by the vector index.
///
/// Metadata is kept loosely typed: ingestion has written both
/// `article_title`/`title`, `text`/`content`, `article_published_time`/
/// `published_at` and `article_url`/`url` over time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsMatch {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewsMatch {
    fn field(&self, primary: &str, fallback: Option<&str>) -> Option<&str> {
        let non_empty = |key: &str| {
            self.metadata
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        non_empty(primary).or_else(|| fallback.and_then(non_empty))
    }

    /// The news id the match was indexed under, falling back to the vector id.
    #[must_use]
    pub fn news_id(&self) -> &str {
        self.field("news_id", None).unwrap_or(&self.id)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.field("article_title", Some("title"))
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.field("text", Some("content"))
    }

    #[must_use]
    pub fn published_at(&self) -> Option<&str> {
        self.field("article_published_time", Some("published_at"))
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.field("source", None)
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.field("article_url", Some("url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_match(metadata: Value) -> NewsMatch {
        serde_json::from_value(serde_json::json!({
            "id": "vec-1",
            "score": 0.5,
            "metadata": metadata,
        }))
        .unwrap()
    }

    #[test]
    fn prefers_article_prefixed_keys() {
        let m = news_match(serde_json::json!({
            "article_title": "Primary",
            "title": "Fallback",
            "article_url": "https://a.example",
            "url": "https://b.example",
        }));
        assert_eq!(m.title(), Some("Primary"));
        assert_eq!(m.url(), Some("https://a.example"));
    }

    #[test]
    fn falls_back_to_plain_keys() {
        let m = news_match(serde_json::json!({
            "title": "Plain",
            "content": "Body",
            "published_at": "2025-01-01",
        }));
        assert_eq!(m.title(), Some("Plain"));
        assert_eq!(m.content(), Some("Body"));
        assert_eq!(m.published_at(), Some("2025-01-01"));
        assert_eq!(m.source(), None);
    }

    #[test]
    fn news_id_falls_back_to_vector_id() {
        let m = news_match(serde_json::json!({}));
        assert_eq!(m.news_id(), "vec-1");

        let m = news_match(serde_json::json!({ "news_id": "n-42" }));
        assert_eq!(m.news_id(), "n-42");
    }

    #[test]
    fn missing_metadata_defaults_to_empty() {
        let m: NewsMatch = serde_json::from_value(serde_json::json!({ "id": "x" })).unwrap();
        assert!(m.metadata.is_empty());
        assert!(m.score.abs() < f64::EPSILON);
    }
}
