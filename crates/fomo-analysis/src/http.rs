use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::AnalysisError;

const USER_AGENT: &str = "fomo-news/0.1 (news-analysis)";

/// Longest error body kept in [`AnalysisError::Status`].
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, AnalysisError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Pass successful responses through; turn anything else into
/// [`AnalysisError::Status`] carrying a truncated body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AnalysisError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    context: &str,
    response: Response,
) -> Result<T, AnalysisError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| AnalysisError::Deserialize {
        context: context.to_string(),
        source,
    })
}
