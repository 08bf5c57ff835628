//! Live integration tests for fomo-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` resolves to the workspace
//! migration directory.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fomo_core::{
    run_gate, AnalysisReport, Analyzer, CompanyRecord, CompanyStore, Digest, OutcomeStatus,
    ReportStatus, RunParams,
};
use fomo_db::{
    complete_analysis_run, create_analysis_run, fail_analysis_run, get_analysis_run,
    get_company_by_name, list_analysis_run_companies, list_analysis_runs,
    list_company_news_ids, start_analysis_run, update_last_article_count,
    upsert_analysis_run_company, DbError, PgCompanyStore, RunCounts,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_company(
    pool: &sqlx::PgPool,
    name: &str,
    current: Option<i64>,
    last: Option<i64>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO companies (name, current_article_count_24hrs, last_article_count_24hrs) \
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(current)
    .bind(last)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_company failed for '{name}': {e}"))
}

async fn insert_news(pool: &sqlx::PgPool, id: &str, companies: &[&str], hours_ago: i64) {
    let companies: Vec<String> = companies.iter().map(ToString::to_string).collect();
    sqlx::query(
        "INSERT INTO news_items (id, title, companies, published_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(format!("headline {id}"))
    .bind(companies)
    .bind(Utc::now() - Duration::hours(hours_ago))
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_news failed for '{id}': {e}"));
}

async fn stored_summary(pool: &sqlx::PgPool, id: i64) -> Option<serde_json::Value> {
    sqlx::query_scalar::<_, Option<serde_json::Value>>(
        "SELECT summary_24hrs FROM companies WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("summary lookup failed")
}

#[derive(Debug, thiserror::Error)]
#[error("model unavailable")]
struct ModelUnavailable;

/// Analyzer that returns a fixed digest, or fails for one named company.
struct FixedAnalyzer {
    fail_for: Option<&'static str>,
}

#[async_trait]
impl Analyzer for FixedAnalyzer {
    type Error = ModelUnavailable;

    async fn analyze(
        &self,
        company: &CompanyRecord,
        hours: u32,
    ) -> Result<AnalysisReport, ModelUnavailable> {
        if self.fail_for == Some(company.name.as_str()) {
            return Err(ModelUnavailable);
        }
        Ok(AnalysisReport {
            status: ReportStatus::Success,
            news_count: 1,
            digest: Some(Digest::default()),
            sources: Vec::new(),
            time_range_hours: hours,
            message: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Companies and news
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn update_last_article_count_sets_counter(pool: sqlx::PgPool) {
    let id = insert_company(&pool, "Acme", Some(9), None).await;

    update_last_article_count(&pool, id, 9)
        .await
        .expect("update_last_article_count failed");

    let row = get_company_by_name(&pool, "Acme")
        .await
        .expect("get_company_by_name failed")
        .expect("company should exist");
    assert_eq!(row.last_article_count_24hrs, Some(9));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_last_article_count_unknown_company_is_not_found(pool: sqlx::PgPool) {
    let err = update_last_article_count(&pool, 9_999, 1)
        .await
        .expect_err("unknown id should fail");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn news_ids_match_exact_and_substring_within_window(pool: sqlx::PgPool) {
    insert_news(&pool, "n-exact", &["Acme"], 1).await;
    insert_news(&pool, "n-substr", &["Acme Holdings", "Other"], 2).await;
    insert_news(&pool, "n-old", &["Acme"], 48).await;
    insert_news(&pool, "n-other", &["Globex"], 1).await;

    let ids = list_company_news_ids(&pool, "Acme", Utc::now() - Duration::hours(24))
        .await
        .expect("list_company_news_ids failed");

    assert_eq!(ids, vec!["n-exact".to_string(), "n-substr".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn news_ids_blank_name_matches_nothing(pool: sqlx::PgPool) {
    insert_news(&pool, "n-1", &["Acme"], 1).await;

    let ids = list_company_news_ids(&pool, "  ", Utc::now() - Duration::hours(24))
        .await
        .expect("list_company_news_ids failed");
    assert!(ids.is_empty());
}

// ---------------------------------------------------------------------------
// Store and gate end to end
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn run_advances_counters_only_for_successful_companies(pool: sqlx::PgPool) {
    let changed = insert_company(&pool, "Changed", Some(12), Some(10)).await;
    let unchanged = insert_company(&pool, "Unchanged", Some(5), Some(5)).await;
    let broken = insert_company(&pool, "Broken", Some(3), None).await;
    let emptied = insert_company(&pool, "Emptied", Some(0), Some(4)).await;

    sqlx::query("UPDATE companies SET summary_24hrs = '{\"stale\": true}' WHERE id = $1")
        .bind(emptied)
        .execute(&pool)
        .await
        .expect("seed summary failed");

    let store = PgCompanyStore::new(pool.clone());
    let analyzer = FixedAnalyzer {
        fail_for: Some("Broken"),
    };
    let report = run_gate(&store, &analyzer, &RunParams::default())
        .await
        .expect("run_gate failed");

    assert_eq!((report.analyzed, report.skipped, report.failed), (2, 1, 1));
    assert!(!report.has_persistence_failures());

    let records = store.list_companies().await.expect("list failed");
    let last_of = |id: i64| {
        records
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.last_article_count)
    };
    assert_eq!(last_of(changed), Some(12));
    assert_eq!(last_of(unchanged), Some(5));
    assert_eq!(last_of(broken), None);
    assert_eq!(last_of(emptied), Some(0));

    let summary = stored_summary(&pool, changed).await.expect("summary saved");
    assert_eq!(summary["status"], "success");
    assert!(summary.get("updated_at").is_some());
    assert!(stored_summary(&pool, emptied).await.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn preview_run_writes_nothing(pool: sqlx::PgPool) {
    let id = insert_company(&pool, "Acme", Some(7), Some(2)).await;

    let store = PgCompanyStore::new(pool.clone());
    let params = RunParams::new(24, None, false).expect("valid params");
    let report = run_gate(&store, &FixedAnalyzer { fail_for: None }, &params)
        .await
        .expect("run_gate failed");

    assert_eq!(report.analyzed, 1);
    assert!(!report.outcomes[0].recorded);

    let row = get_company_by_name(&pool, "Acme")
        .await
        .expect("lookup failed")
        .expect("company should exist");
    assert_eq!(row.last_article_count_24hrs, Some(2));
    assert!(stored_summary(&pool, id).await.is_none());
}

// ---------------------------------------------------------------------------
// Analysis run ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let params = RunParams::new(6, Some("Acme".to_string()), true).expect("valid params");
    let run = create_analysis_run(&pool, "cli", &params)
        .await
        .expect("create_analysis_run failed");

    assert_eq!(run.status, "queued");
    assert_eq!(run.hours, 6);
    assert_eq!(run.company_filter.as_deref(), Some("Acme"));

    start_analysis_run(&pool, run.id)
        .await
        .expect("start_analysis_run failed");

    let counts = RunCounts {
        analyzed: 3,
        skipped: 2,
        failed: 1,
    };
    complete_analysis_run(&pool, run.id, counts)
        .await
        .expect("complete_analysis_run failed");

    let fetched = get_analysis_run(&pool, run.id)
        .await
        .expect("get_analysis_run failed");
    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());
    assert_eq!(
        (fetched.analyzed_count, fetched.skipped_count, fetched.failed_count),
        (3, 2, 1)
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_run_lifecycle_queued_to_failed(pool: sqlx::PgPool) {
    let run = create_analysis_run(&pool, "scheduler", &RunParams::default())
        .await
        .expect("create_analysis_run failed");
    start_analysis_run(&pool, run.id)
        .await
        .expect("start_analysis_run failed");

    fail_analysis_run(&pool, run.id, RunCounts::default(), "summary write failed")
        .await
        .expect("fail_analysis_run failed");

    let fetched = get_analysis_run(&pool, run.id)
        .await
        .expect("get_analysis_run failed");
    assert_eq!(fetched.status, "failed");
    assert_eq!(fetched.error_message.as_deref(), Some("summary write failed"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_run_cannot_complete_before_start(pool: sqlx::PgPool) {
    let run = create_analysis_run(&pool, "cli", &RunParams::default())
        .await
        .expect("create_analysis_run failed");

    let err = complete_analysis_run(&pool, run.id, RunCounts::default())
        .await
        .expect_err("queued run must not complete");
    assert!(matches!(
        err,
        DbError::InvalidAnalysisRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_run_company_upsert_overwrites(pool: sqlx::PgPool) {
    let company_id = insert_company(&pool, "Acme", Some(4), None).await;
    let run = create_analysis_run(&pool, "cli", &RunParams::default())
        .await
        .expect("create_analysis_run failed");

    let store = PgCompanyStore::new(pool.clone());
    let report = run_gate(&store, &FixedAnalyzer { fail_for: Some("Acme") }, &RunParams::default())
        .await
        .expect("run_gate failed");
    let mut outcome = report.outcomes[0].clone();
    assert_eq!(outcome.status, OutcomeStatus::Failed);

    upsert_analysis_run_company(&pool, run.id, &outcome)
        .await
        .expect("first upsert failed");

    outcome.status = OutcomeStatus::Analyzed;
    outcome.recorded = true;
    outcome.reason = None;
    upsert_analysis_run_company(&pool, run.id, &outcome)
        .await
        .expect("second upsert failed");

    let rows = list_analysis_run_companies(&pool, run.id)
        .await
        .expect("list_analysis_run_companies failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].company_id, company_id);
    assert_eq!(rows[0].status, "analyzed");
    assert_eq!(rows[0].observed_count_at_start, Some(4));
    assert!(rows[0].recorded);
    assert!(rows[0].error_message.is_none());

    let runs = list_analysis_runs(&pool, 10).await.expect("list runs failed");
    assert_eq!(runs.len(), 1);
}
