//! Database operations for the `companies` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `companies` table.
///
/// `summary_24hrs` is not selected here; it is write-only from this job's
/// point of view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub name: String,
    pub current_article_count_24hrs: Option<i64>,
    pub last_article_count_24hrs: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for fomo_core::CompanyRecord {
    fn from(row: CompanyRow) -> Self {
        fomo_core::CompanyRecord {
            id: row.id,
            name: row.name,
            current_article_count: row.current_article_count_24hrs,
            last_article_count: row.last_article_count_24hrs,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all companies, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_companies(pool: &PgPool) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, name, current_article_count_24hrs, last_article_count_24hrs, \
                created_at, updated_at \
         FROM companies \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single company by exact name, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_company_by_name(pool: &PgPool, name: &str) -> Result<Option<CompanyRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, name, current_article_count_24hrs, last_article_count_24hrs, \
                created_at, updated_at \
         FROM companies \
         WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Sets `last_article_count_24hrs` for one company.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no company has the given id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_last_article_count(
    pool: &PgPool,
    company_id: i64,
    count: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE companies \
         SET last_article_count_24hrs = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(count)
    .bind(company_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Writes (or clears, when `summary` is `None`) `summary_24hrs` for one company.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no company has the given id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_company_summary(
    pool: &PgPool,
    company_id: i64,
    summary: Option<Value>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE companies \
         SET summary_24hrs = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(summary)
    .bind(company_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
