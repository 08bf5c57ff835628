//! Database operations for `analysis_runs` and `analysis_run_companies`.
//!
//! These tables are the job's own ledger. They record what each run saw and
//! decided, and are never read back by the change-detection gate.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `analysis_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub hours: i32,
    pub company_filter: Option<String>,
    pub save_to_db: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub analyzed_count: i32,
    pub skipped_count: i32,
    pub failed_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `analysis_run_companies` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRunCompanyRow {
    pub id: i64,
    pub analysis_run_id: i64,
    pub company_id: i64,
    pub status: String,
    pub observed_count_at_start: Option<i64>,
    pub recorded: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Final tallies written when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub analyzed: i32,
    pub skipped: i32,
    pub failed: i32,
}

impl RunCounts {
    /// Builds counts from a run report, saturating at `i32::MAX`.
    #[must_use]
    pub fn from_report(report: &fomo_core::RunReport) -> Self {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        Self {
            analyzed: clamp(report.analyzed),
            skipped: clamp(report.skipped),
            failed: clamp(report.failed),
        }
    }
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, hours, company_filter, \
                           save_to_db, started_at, completed_at, analyzed_count, \
                           skipped_count, failed_count, error_message, created_at";

// ---------------------------------------------------------------------------
// analysis_runs operations
// ---------------------------------------------------------------------------

/// Creates a new analysis run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_analysis_run(
    pool: &PgPool,
    trigger_source: &str,
    params: &fomo_core::RunParams,
) -> Result<AnalysisRunRow, DbError> {
    let public_id = Uuid::new_v4();
    let hours = i32::try_from(params.hours).unwrap_or(i32::MAX);

    let sql = format!(
        "INSERT INTO analysis_runs \
             (public_id, trigger_source, status, hours, company_filter, save_to_db) \
         VALUES ($1, $2, 'queued', $3, $4, $5) \
         RETURNING {RUN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AnalysisRunRow>(&sql)
        .bind(public_id)
        .bind(trigger_source)
        .bind(hours)
        .bind(params.company.as_deref())
        .bind(params.save_to_db)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidAnalysisRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_analysis_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE analysis_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAnalysisRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and stores its final counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidAnalysisRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_analysis_run(
    pool: &PgPool,
    id: i64,
    counts: RunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE analysis_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             analyzed_count = $1, skipped_count = $2, failed_count = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(counts.analyzed)
    .bind(counts.skipped)
    .bind(counts.failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAnalysisRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, recording whatever counts were reached and the
/// error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidAnalysisRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_analysis_run(
    pool: &PgPool,
    id: i64,
    counts: RunCounts,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE analysis_runs \
         SET status = 'failed', completed_at = NOW(), \
             analyzed_count = $1, skipped_count = $2, failed_count = $3, \
             error_message = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(counts.analyzed)
    .bind(counts.skipped)
    .bind(counts.failed)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidAnalysisRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis_run(pool: &PgPool, id: i64) -> Result<AnalysisRunRow, DbError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM analysis_runs WHERE id = $1");
    let row = sqlx::query_as::<_, AnalysisRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analysis_runs(pool: &PgPool, limit: i64) -> Result<Vec<AnalysisRunRow>, DbError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM analysis_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, AnalysisRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// analysis_run_companies operations
// ---------------------------------------------------------------------------

/// Inserts or updates the per-company outcome row for a run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_analysis_run_company(
    pool: &PgPool,
    run_id: i64,
    outcome: &fomo_core::AnalysisOutcome,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO analysis_run_companies \
             (analysis_run_id, company_id, status, observed_count_at_start, recorded, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (analysis_run_id, company_id) DO UPDATE SET \
             status                  = EXCLUDED.status, \
             observed_count_at_start = EXCLUDED.observed_count_at_start, \
             recorded                = EXCLUDED.recorded, \
             error_message           = EXCLUDED.error_message",
    )
    .bind(run_id)
    .bind(outcome.company_id)
    .bind(outcome.status.as_str())
    .bind(outcome.observed_count_at_start)
    .bind(outcome.recorded)
    .bind(outcome.reason.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns all company-level rows for a given run, ordered by `company_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analysis_run_companies(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<AnalysisRunCompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalysisRunCompanyRow>(
        "SELECT id, analysis_run_id, company_id, status, observed_count_at_start, \
                recorded, error_message, created_at \
         FROM analysis_run_companies \
         WHERE analysis_run_id = $1 \
         ORDER BY company_id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
