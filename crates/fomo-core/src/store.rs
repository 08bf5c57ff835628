//! Capability seams for the external services the run depends on.

use async_trait::async_trait;

use crate::analysis::AnalysisReport;
use crate::company::CompanyRecord;

/// Read and point-update access to company records.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All companies, in the store's natural listing order.
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, Self::Error>;

    /// Set `last_article_count` for one company.
    async fn update_last_article_count(&self, company_id: i64, count: i64)
        -> Result<(), Self::Error>;

    /// Persist the analysis digest for one company.
    async fn save_summary(
        &self,
        company_id: i64,
        report: &AnalysisReport,
    ) -> Result<(), Self::Error>;

    /// Clear the stored digest for one company.
    async fn clear_summary(&self, company_id: i64) -> Result<(), Self::Error>;
}

/// Runs the retrieval-augmented analysis for a single company.
#[async_trait]
pub trait Analyzer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn analyze(
        &self,
        company: &CompanyRecord,
        hours: u32,
    ) -> Result<AnalysisReport, Self::Error>;
}
