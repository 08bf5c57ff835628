//! Company records and per-run outcomes.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisReport;

/// A company tracked by the digest job.
///
/// `current_article_count` is maintained by the upstream ingestion process;
/// `last_article_count` is the only state this job writes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    /// Latest known article count in the lookback window. `None` when the
    /// ingestion process has not reported a count yet.
    pub current_article_count: Option<i64>,
    /// Count recorded by the most recent completed analysis. `None` when the
    /// company has never been analyzed.
    pub last_article_count: Option<i64>,
}

impl CompanyRecord {
    #[must_use]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        current_article_count: Option<i64>,
        last_article_count: Option<i64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            current_article_count,
            last_article_count,
        }
    }
}

/// Result of processing one company during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Analyzed,
    Skipped,
    Failed,
}

impl OutcomeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Analyzed => "analyzed",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-company outcome of one run. Carried into the run artifact and ledger;
/// never read back by the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub company_id: i64,
    pub company_name: String,
    pub status: OutcomeStatus,
    /// `current_article_count` captured at gate time. The counter update uses
    /// this value, never a count re-read after analysis.
    pub observed_count_at_start: Option<i64>,
    /// Whether `last_article_count` was advanced during this run.
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<AnalysisReport>,
}

impl AnalysisOutcome {
    pub(crate) fn skipped(record: &CompanyRecord, reason: impl Into<String>) -> Self {
        Self {
            company_id: record.id,
            company_name: record.name.clone(),
            status: OutcomeStatus::Skipped,
            observed_count_at_start: record.current_article_count,
            recorded: false,
            reason: Some(reason.into()),
            detail: None,
        }
    }

    pub(crate) fn failed(record: &CompanyRecord, snapshot: i64, reason: impl Into<String>) -> Self {
        Self {
            company_id: record.id,
            company_name: record.name.clone(),
            status: OutcomeStatus::Failed,
            observed_count_at_start: Some(snapshot),
            recorded: false,
            reason: Some(reason.into()),
            detail: None,
        }
    }

    pub(crate) fn analyzed(record: &CompanyRecord, snapshot: i64, report: AnalysisReport) -> Self {
        Self {
            company_id: record.id,
            company_name: record.name.clone(),
            status: OutcomeStatus::Analyzed,
            observed_count_at_start: Some(snapshot),
            recorded: false,
            reason: None,
            detail: Some(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_status_serializes_snake_case() {
        let json = serde_json::to_string(&OutcomeStatus::Analyzed).unwrap();
        assert_eq!(json, "\"analyzed\"");
        assert_eq!(OutcomeStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn skipped_outcome_keeps_observed_count() {
        let record = CompanyRecord::new(3, "Acme", Some(5), Some(5));
        let outcome = AnalysisOutcome::skipped(&record, "article count unchanged");
        assert_eq!(outcome.status, OutcomeStatus::Skipped);
        assert_eq!(outcome.observed_count_at_start, Some(5));
        assert!(!outcome.recorded);
        assert!(outcome.detail.is_none());
    }
}
