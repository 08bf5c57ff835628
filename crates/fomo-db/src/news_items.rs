//! Database operations for the `news_items` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Returns ids of news items published at or after `since` that mention
/// `company_name`, newest first.
///
/// A news item mentions a company when any element of its `companies` array
/// equals or contains the name. A blank name matches nothing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_company_news_ids(
    pool: &PgPool,
    company_name: &str,
    since: DateTime<Utc>,
) -> Result<Vec<String>, DbError> {
    let name = company_name.trim();
    if name.is_empty() {
        return Ok(Vec::new());
    }

    let ids = sqlx::query_scalar::<_, String>(
        "SELECT id \
         FROM news_items \
         WHERE published_at >= $1 \
           AND EXISTS (SELECT 1 FROM unnest(companies) AS c WHERE strpos(c, $2) > 0) \
         ORDER BY published_at DESC, id",
    )
    .bind(since)
    .bind(name)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
