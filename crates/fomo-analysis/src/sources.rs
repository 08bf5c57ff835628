//! Source list attached to each report.

use std::collections::HashSet;

use fomo_core::SourceRef;

use crate::types::NewsMatch;

/// Build the source list from vector matches.
///
/// Keeps the first match per URL, drops matches without a URL, rounds scores
/// to three decimals, and orders by score, highest first. Ties keep index
/// order.
#[must_use]
pub fn extract_sources(matches: &[NewsMatch]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    let mut sources: Vec<SourceRef> = matches
        .iter()
        .filter_map(|m| {
            let url = m.url()?;
            if !seen.insert(url) {
                return None;
            }
            Some(SourceRef {
                news_id: m.news_id().to_string(),
                title: m.title().unwrap_or("(untitled)").to_string(),
                source: m.source().unwrap_or("unknown").to_string(),
                published_at: m.published_at().unwrap_or("unknown").to_string(),
                url: url.to_string(),
                score: round3(m.score),
            })
        })
        .collect();

    sources.sort_by(|a, b| b.score.total_cmp(&a.score));
    sources
}

fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
