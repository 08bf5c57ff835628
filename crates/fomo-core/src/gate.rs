//! Change-detection gate.
//!
//! A company is re-analyzed only when its current article count differs from
//! the count recorded at its last completed analysis. The comparison is plain
//! inequality: a count that went down (deleted or corrected articles) also
//! selects the company.

use crate::company::CompanyRecord;

/// Gate verdict for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Counts differ; analyze using `snapshot` as the count to record later.
    Analyze { snapshot: i64 },
    /// Counts are equal; nothing new since the last analysis.
    Unchanged,
    /// The current count is unknown, so change cannot be determined.
    UnknownCurrent,
}

impl GateDecision {
    #[must_use]
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            GateDecision::Analyze { .. } => None,
            GateDecision::Unchanged => Some("article count unchanged"),
            GateDecision::UnknownCurrent => Some("current article count unavailable"),
        }
    }
}

/// A record selected for analysis, with the count observed at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub record: CompanyRecord,
    pub observed_count_at_start: i64,
}

/// Decide whether `record` needs analysis.
///
/// A missing `last_article_count` never equals a known count, so companies
/// that were never analyzed are always eligible.
#[must_use]
pub fn gate_decision(record: &CompanyRecord) -> GateDecision {
    match (record.current_article_count, record.last_article_count) {
        (None, _) => GateDecision::UnknownCurrent,
        (Some(current), Some(last)) if current == last => GateDecision::Unchanged,
        (Some(current), _) => GateDecision::Analyze { snapshot: current },
    }
}

/// Return every record whose counts differ, in input order.
#[must_use]
pub fn select_for_analysis(records: &[CompanyRecord]) -> Vec<Selection> {
    records
        .iter()
        .filter_map(|record| match gate_decision(record) {
            GateDecision::Analyze { snapshot } => Some(Selection {
                record: record.clone(),
                observed_count_at_start: snapshot,
            }),
            GateDecision::Unchanged | GateDecision::UnknownCurrent => None,
        })
        .collect()
}

/// Return a copy of `record` with `last_article_count` advanced to the count
/// observed when the record was selected.
///
/// Call only after the analysis for this company has succeeded.
#[must_use]
pub fn record_completed(record: &CompanyRecord, observed_count_at_start: i64) -> CompanyRecord {
    CompanyRecord {
        last_article_count: Some(observed_count_at_start),
        ..record.clone()
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
