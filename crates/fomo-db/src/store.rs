//! Postgres-backed [`CompanyStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fomo_core::{AnalysisReport, CompanyRecord, CompanyStore};
use serde_json::Value;
use sqlx::PgPool;

use crate::{companies, DbError};

/// [`CompanyStore`] over the `companies` table.
#[derive(Debug, Clone)]
pub struct PgCompanyStore {
    pool: PgPool,
}

impl PgCompanyStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Builds the JSON stored in `summary_24hrs`: the serialized report with an
/// `updated_at` timestamp added at the top level.
///
/// # Errors
///
/// Returns [`DbError::Encode`] if the report cannot be serialized.
pub fn summary_payload(report: &AnalysisReport, now: DateTime<Utc>) -> Result<Value, DbError> {
    let mut value = serde_json::to_value(report)?;
    if let Value::Object(map) = &mut value {
        map.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));
    }
    Ok(value)
}

#[async_trait]
impl CompanyStore for PgCompanyStore {
    type Error = DbError;

    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, DbError> {
        let rows = companies::list_companies(&self.pool).await?;
        Ok(rows.into_iter().map(CompanyRecord::from).collect())
    }

    async fn update_last_article_count(&self, company_id: i64, count: i64) -> Result<(), DbError> {
        companies::update_last_article_count(&self.pool, company_id, count).await
    }

    async fn save_summary(&self, company_id: i64, report: &AnalysisReport) -> Result<(), DbError> {
        let payload = summary_payload(report, Utc::now())?;
        companies::update_company_summary(&self.pool, company_id, Some(payload)).await
    }

    async fn clear_summary(&self, company_id: i64) -> Result<(), DbError> {
        companies::update_company_summary(&self.pool, company_id, None).await
    }
}
