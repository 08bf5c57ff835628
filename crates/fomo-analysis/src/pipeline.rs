//! Per-company analysis orchestration.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fomo_core::{AnalysisReport, Analyzer, CompanyRecord, Digest, ReportStatus};
use sqlx::PgPool;

use crate::digest::{build_digest_prompt, build_repair_prompt, company_query, parse_digest};
use crate::embeddings::EmbeddingClient;
use crate::error::AnalysisError;
use crate::llm::GenerativeClient;
use crate::retry::retry_with_backoff;
use crate::sources::extract_sources;
use crate::types::{AnalysisConfig, NewsMatch};
use crate::vector_store::VectorIndexClient;

/// Source of the news ids mentioning a company inside a time window.
#[async_trait]
pub trait NewsIds: Send + Sync {
    async fn news_ids(
        &self,
        company_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, AnalysisError>;
}

#[async_trait]
impl NewsIds for PgPool {
    async fn news_ids(
        &self,
        company_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, AnalysisError> {
        Ok(fomo_db::list_company_news_ids(self, company_name, since).await?)
    }
}

/// The retrieval-augmented analyzer: news ids, query embedding, vector search,
/// then a model-written digest.
pub struct NewsPipeline<N = PgPool> {
    news: N,
    embeddings: EmbeddingClient,
    index: VectorIndexClient,
    llm: GenerativeClient,
    top_k: usize,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl<N: NewsIds> NewsPipeline<N> {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if an HTTP client cannot be built.
    pub fn new(config: &AnalysisConfig, news: N) -> Result<Self, AnalysisError> {
        Ok(Self {
            news,
            embeddings: EmbeddingClient::new(config)?,
            index: VectorIndexClient::new(config)?,
            llm: GenerativeClient::new(config)?,
            top_k: config.search_top_k,
            max_retries: config.llm_max_retries,
            backoff_base_ms: config.llm_retry_backoff_ms,
        })
    }

    /// Analyze one company's news from the last `hours` hours.
    ///
    /// No news in the window yields a `NoNews` report, and news that the
    /// vector index has no content for yields `NoVectorData`. Neither is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if `hours` reaches outside the
    /// representable calendar, or another [`AnalysisError`] if the news lookup
    /// fails or embedding, search, or generation still fails after retries.
    pub async fn analyze_company(
        &self,
        company_name: &str,
        hours: u32,
    ) -> Result<AnalysisReport, AnalysisError> {
        let since = window_start(Utc::now(), hours)?;
        let news_ids = self.news.news_ids(company_name, since).await?;

        if news_ids.is_empty() {
            tracing::info!(company = company_name, hours, "no news in window");
            return Ok(AnalysisReport::no_news(hours));
        }
        tracing::info!(company = company_name, news = news_ids.len(), "news ids found");

        let query = company_query(company_name);
        let vector = retry_with_backoff("embed", self.max_retries, self.backoff_base_ms, || {
            self.embeddings.embed(&query)
        })
        .await?;

        let matches = retry_with_backoff(
            "vector search",
            self.max_retries,
            self.backoff_base_ms,
            || self.index.query(&vector, &news_ids, self.top_k),
        )
        .await?;

        if matches.is_empty() {
            tracing::warn!(
                company = company_name,
                news = news_ids.len(),
                "vector index has no content for these news ids"
            );
            return Ok(AnalysisReport {
                status: ReportStatus::NoVectorData,
                news_count: news_ids.len(),
                digest: None,
                sources: Vec::new(),
                time_range_hours: hours,
                message: Some(format!(
                    "found {} news records but the vector index holds no content for them",
                    news_ids.len()
                )),
            });
        }

        let digest = self.generate_digest(company_name, &matches).await?;
        let sources = extract_sources(&matches);

        tracing::info!(
            company = company_name,
            matches = matches.len(),
            facts = digest.facts.len(),
            opinions = digest.opinions.len(),
            sources = sources.len(),
            "digest generated"
        );

        Ok(AnalysisReport {
            status: ReportStatus::Success,
            news_count: news_ids.len(),
            digest: Some(digest),
            sources,
            time_range_hours: hours,
            message: None,
        })
    }

    async fn generate_digest(
        &self,
        company_name: &str,
        matches: &[NewsMatch],
    ) -> Result<Digest, AnalysisError> {
        let prompt = build_digest_prompt(company_name, matches);
        let prompt = prompt.as_str();
        tracing::debug!(
            company = company_name,
            model = self.llm.model(),
            prompt_chars = prompt.chars().count(),
            "requesting digest"
        );

        // The first attempt is the initial generation; only the remaining
        // ones are retries.
        retry_with_backoff(
            "digest",
            self.max_retries.saturating_sub(1),
            self.backoff_base_ms,
            || self.attempt_digest(company_name, prompt),
        )
        .await
    }

    /// One generation, with a single repair pass if the reply is malformed.
    async fn attempt_digest(&self, company_name: &str, prompt: &str) -> Result<Digest, AnalysisError> {
        let reply = self.llm.generate(prompt).await?;
        let err = match parse_digest(&reply) {
            Ok(digest) => return Ok(digest),
            Err(e) => e,
        };

        tracing::warn!(company = company_name, error = %err, "malformed digest; asking model to repair");
        let repaired = self.llm.generate(&build_repair_prompt(&reply)).await?;
        parse_digest(&repaired)
    }
}

#[async_trait]
impl<N: NewsIds> Analyzer for NewsPipeline<N> {
    type Error = AnalysisError;

    async fn analyze(
        &self,
        company: &CompanyRecord,
        hours: u32,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_company(&company.name, hours).await
    }
}

fn window_start(now: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>, AnalysisError> {
    Duration::try_hours(i64::from(hours))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| AnalysisError::Config(format!("lookback of {hours} hours is out of range")))
}

/// Probe the embedding model and the vector index with one cheap call each.
///
/// # Errors
///
/// Returns the first [`AnalysisError`] encountered.
pub async fn check_connections(config: &AnalysisConfig) -> Result<(), AnalysisError> {
    let embeddings = EmbeddingClient::new(config)?;
    embeddings.embed("connectivity check").await?;
    tracing::info!(model = %config.embedding_model, "embedding model reachable");

    let index = VectorIndexClient::new(config)?;
    index.describe_index_stats().await?;
    tracing::info!(host = %config.pinecone_index_host, "vector index reachable");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_start_subtracts_hours() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let since = window_start(now, 36).unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_start_rejects_out_of_range_hours() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        assert!(matches!(
            window_start(now, u32::MAX),
            Err(AnalysisError::Config(_))
        ));
    }
}
