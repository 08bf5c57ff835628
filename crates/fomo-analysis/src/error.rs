use thiserror::Error;

/// Errors raised while analyzing one company.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote service answered with a non-success status.
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("embedding error: {0}")]
    Embedding(String),

    /// The generation model returned no text.
    #[error("generation model returned an empty response")]
    EmptyResponse,

    /// Generation produced text that never parsed into a valid digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("news lookup failed: {0}")]
    NewsLookup(#[from] fomo_db::DbError),

    #[error("analysis configuration error: {0}")]
    Config(String),
}
