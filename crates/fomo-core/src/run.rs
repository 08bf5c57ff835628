//! One scheduled run: list companies, gate each one, analyze the changed ones,
//! and advance their counters.
//!
//! Companies are processed sequentially and independently. Within a company
//! the order is fixed: snapshot the count, call the analyzer, then write the
//! summary and the counter. A failed analysis writes nothing, so the next run
//! selects the company again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{AnalysisReport, ReportStatus};
use crate::company::{AnalysisOutcome, CompanyRecord, OutcomeStatus};
use crate::gate::{gate_decision, GateDecision};
use crate::store::{Analyzer, CompanyStore};

/// Default lookback window in hours.
pub const DEFAULT_HOURS: u32 = 24;

/// Longest accepted lookback window: one year.
pub const MAX_HOURS: u32 = 8_760;

/// Parameters supplied by the trigger for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    pub hours: u32,
    /// Restrict the run to one company by name. `None` means all companies.
    pub company: Option<String>,
    /// When `false` nothing is written back: no summaries, no counters.
    pub save_to_db: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HOURS,
            company: None,
            save_to_db: true,
        }
    }
}

impl RunParams {
    /// Build validated run parameters. A blank company name means "all".
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidParams`] if `hours` is zero or above
    /// [`MAX_HOURS`].
    pub fn new(hours: u32, company: Option<String>, save_to_db: bool) -> Result<Self, RunError> {
        if hours == 0 {
            return Err(RunError::InvalidParams(
                "hours must be greater than zero".to_string(),
            ));
        }
        if hours > MAX_HOURS {
            return Err(RunError::InvalidParams(format!(
                "hours must be at most {MAX_HOURS}, got {hours}"
            )));
        }
        let company = company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Self {
            hours,
            company,
            save_to_db,
        })
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to list companies: {0}")]
    Store(String),

    #[error("company '{0}' not found")]
    CompanyNotFound(String),

    #[error("invalid run parameters: {0}")]
    InvalidParams(String),
}

/// A write that failed after a successful analysis. The company's counter was
/// not advanced, so it is analyzed again next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceFailure {
    pub company_id: i64,
    pub company_name: String,
    pub message: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub params: RunParams,
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<AnalysisOutcome>,
    pub persistence_errors: Vec<PersistenceFailure>,
}

impl RunReport {
    #[must_use]
    pub fn has_persistence_failures(&self) -> bool {
        !self.persistence_errors.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Execute one run against the given store and analyzer.
///
/// Per-company analysis failures are recorded as `failed` outcomes and do not
/// stop the run. Write failures after a successful analysis are collected in
/// [`RunReport::persistence_errors`] for the caller to surface.
///
/// # Errors
///
/// Returns [`RunError::Store`] if the company list cannot be read, or
/// [`RunError::CompanyNotFound`] if the single-company override names an
/// unknown company.
pub async fn run_gate<S, A>(
    store: &S,
    analyzer: &A,
    params: &RunParams,
) -> Result<RunReport, RunError>
where
    S: CompanyStore,
    A: Analyzer,
{
    let started_at = Utc::now();

    let companies = store
        .list_companies()
        .await
        .map_err(|e| RunError::Store(e.to_string()))?;

    let companies = match params.company.as_deref() {
        Some(name) => vec![find_company(companies, name)?],
        None => companies,
    };

    if companies.is_empty() {
        tracing::info!("no companies found; nothing to analyze");
    } else {
        tracing::info!(
            count = companies.len(),
            hours = params.hours,
            save_to_db = params.save_to_db,
            "checking article counts"
        );
    }

    let mut outcomes = Vec::with_capacity(companies.len());
    let mut persistence_errors = Vec::new();

    for record in &companies {
        let outcome =
            process_company(store, analyzer, params, record, &mut persistence_errors).await;
        outcomes.push(outcome);
    }

    let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
    let analyzed = count(OutcomeStatus::Analyzed);
    let skipped = count(OutcomeStatus::Skipped);
    let failed = count(OutcomeStatus::Failed);

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        params: params.clone(),
        analyzed,
        skipped,
        failed,
        outcomes,
        persistence_errors,
    };

    tracing::info!(
        analyzed = report.analyzed,
        skipped = report.skipped,
        failed = report.failed,
        persistence_errors = report.persistence_errors.len(),
        "run finished"
    );

    Ok(report)
}

/// Resolve the single-company override: exact name first, then a
/// case-insensitive match.
///
/// # Errors
///
/// Returns [`RunError::CompanyNotFound`] if no name matches.
pub fn find_company(companies: Vec<CompanyRecord>, name: &str) -> Result<CompanyRecord, RunError> {
    let index = companies
        .iter()
        .position(|c| c.name == name)
        .or_else(|| companies.iter().position(|c| c.name.eq_ignore_ascii_case(name)));
    index
        .and_then(|i| companies.into_iter().nth(i))
        .ok_or_else(|| RunError::CompanyNotFound(name.to_string()))
}

async fn process_company<S, A>(
    store: &S,
    analyzer: &A,
    params: &RunParams,
    record: &CompanyRecord,
    persistence_errors: &mut Vec<PersistenceFailure>,
) -> AnalysisOutcome
where
    S: CompanyStore,
    A: Analyzer,
{
    let decision = gate_decision(record);
    let snapshot = match decision {
        GateDecision::Analyze { snapshot } => snapshot,
        GateDecision::Unchanged | GateDecision::UnknownCurrent => {
            let reason = decision.skip_reason().unwrap_or("not selected");
            tracing::info!(
                company = %record.name,
                current = ?record.current_article_count,
                last = ?record.last_article_count,
                reason,
                "skipping company"
            );
            return AnalysisOutcome::skipped(record, reason);
        }
    };

    tracing::info!(
        company = %record.name,
        current = snapshot,
        last = ?record.last_article_count,
        "article count changed; analyzing"
    );

    let report = if snapshot == 0 {
        tracing::info!(company = %record.name, "no articles in window; clearing summary");
        AnalysisReport::no_news(params.hours)
    } else {
        match analyzer.analyze(record, params.hours).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(company = %record.name, error = %e, "analysis failed");
                return AnalysisOutcome::failed(record, snapshot, e.to_string());
            }
        }
    };

    let mut outcome = AnalysisOutcome::analyzed(record, snapshot, report);

    if !params.save_to_db {
        tracing::debug!(company = %record.name, "save_to_db disabled; leaving counter unchanged");
        return outcome;
    }

    let Some(report) = outcome.detail.as_ref() else {
        return outcome;
    };

    match persist(store, record, snapshot, report).await {
        Ok(()) => {
            tracing::info!(company = %record.name, count = snapshot, "article count recorded");
            outcome.recorded = true;
        }
        Err(message) => {
            tracing::error!(company = %record.name, error = %message, "failed to persist analysis");
            persistence_errors.push(PersistenceFailure {
                company_id: record.id,
                company_name: record.name.clone(),
                message,
            });
        }
    }

    outcome
}

/// What happens to the stored summary once a company's analysis succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryWrite {
    /// Replace the stored summary with the new digest.
    Save,
    /// The window is empty; the stored summary is cleared.
    Clear,
    /// Nothing usable came back (no indexed content, or the news lookup lagged
    /// behind the counter); the last good summary stays.
    Keep,
}

fn summary_write(report: &AnalysisReport, snapshot: i64) -> SummaryWrite {
    match report.status {
        ReportStatus::Success => SummaryWrite::Save,
        ReportStatus::NoNews if snapshot == 0 => SummaryWrite::Clear,
        ReportStatus::NoNews | ReportStatus::NoVectorData => SummaryWrite::Keep,
    }
}

/// Write the summary, then advance the counter. The counter is only written
/// once the summary write has succeeded.
async fn persist<S: CompanyStore>(
    store: &S,
    record: &CompanyRecord,
    snapshot: i64,
    report: &AnalysisReport,
) -> Result<(), String> {
    let summary = match summary_write(report, snapshot) {
        SummaryWrite::Save => store.save_summary(record.id, report).await,
        SummaryWrite::Clear => store.clear_summary(record.id).await,
        SummaryWrite::Keep => {
            tracing::info!(
                company = %record.name,
                status = ?report.status,
                "no digest produced; keeping stored summary"
            );
            Ok(())
        }
    };
    summary.map_err(|e| format!("summary write failed: {e}"))?;

    store
        .update_last_article_count(record.id, snapshot)
        .await
        .map_err(|e| format!("article count update failed: {e}"))
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
