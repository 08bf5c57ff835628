//! Plain-text rendering of a run for the terminal.

use std::fmt::Write as _;

use fomo_core::{
    AnalysisOutcome, AnalysisReport, OutcomeStatus, ReportStatus, RunReport, Selection, Topic,
};

const RULE_WIDE: usize = 80;
const RULE_NARROW: usize = 60;
/// Citation quotes longer than this are cut and suffixed with `...`.
const QUOTE_CHARS: usize = 50;
const MAX_SOURCES: usize = 5;

pub(crate) fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    let wide = "=".repeat(RULE_WIDE);

    let _ = writeln!(out, "{wide}");
    let _ = writeln!(out, "FOMO news analysis report");
    let _ = writeln!(
        out,
        "Generated: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Window: last {} hours | Company filter: {} | Save to database: {}",
        report.params.hours,
        report.params.company.as_deref().unwrap_or("all"),
        report.params.save_to_db
    );
    let _ = writeln!(out, "{wide}\n");

    for (i, outcome) in report.outcomes.iter().enumerate() {
        render_outcome(&mut out, i + 1, outcome);
        out.push('\n');
    }

    render_totals(&mut out, report);
    out
}

fn render_outcome(out: &mut String, index: usize, outcome: &AnalysisOutcome) {
    let _ = writeln!(out, "{index}. {} [{}]", outcome.company_name, outcome.status);
    let _ = writeln!(out, "{}", "-".repeat(RULE_NARROW));

    match (&outcome.status, &outcome.detail) {
        (OutcomeStatus::Analyzed, Some(detail)) => {
            // Only a recorded zero-count company has its summary cleared.
            let cleared = outcome.recorded && outcome.observed_count_at_start == Some(0);
            render_detail(out, detail, cleared);
            if !outcome.recorded {
                let _ = writeln!(out, "Counter not advanced; will be analyzed again next run");
            }
        }
        _ => {
            if let Some(reason) = &outcome.reason {
                let _ = writeln!(out, "Reason: {reason}");
            }
        }
    }
}

fn render_detail(out: &mut String, detail: &AnalysisReport, cleared: bool) {
    let _ = writeln!(out, "News in window: {}", detail.news_count);

    match (&detail.digest, detail.status) {
        (Some(digest), _) => {
            render_topics(out, "Facts", &digest.facts);
            render_topics(out, "Opinions", &digest.opinions);
        }
        (None, ReportStatus::NoVectorData) => {
            let _ = writeln!(out, "Result: vector index holds no content for these news items");
            if let Some(message) = &detail.message {
                let _ = writeln!(out, "  {message}");
            }
        }
        (None, _) if cleared => {
            let _ = writeln!(out, "Result: no news in window; summary cleared");
        }
        (None, _) => {
            let _ = writeln!(out, "Result: no news in window");
        }
    }

    if detail.sources.is_empty() {
        return;
    }
    let _ = writeln!(out, "Sources:");
    for (i, source) in detail.sources.iter().take(MAX_SOURCES).enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, source.title);
        let _ = writeln!(
            out,
            "     {} | {} | similarity {}",
            source.source, source.published_at, source.score
        );
        let _ = writeln!(out, "     {}", source.url);
    }
    if detail.sources.len() > MAX_SOURCES {
        let _ = writeln!(out, "  ... {} more", detail.sources.len() - MAX_SOURCES);
    }
}

fn render_topics(out: &mut String, heading: &str, topics: &[Topic]) {
    let _ = writeln!(out, "{heading}:");
    if topics.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for topic in topics {
        let _ = writeln!(out, "  * {}", topic.topic);
        for summary in &topic.summaries {
            let _ = writeln!(out, "    - {}: {}", summary.aspect, summary.content);
            for citation in &summary.citations {
                let _ = writeln!(
                    out,
                    "      (cite {}: \"{}\")",
                    citation.news_id,
                    truncate_quote(&citation.content)
                );
            }
        }
    }
}

fn render_totals(out: &mut String, report: &RunReport) {
    let wide = "=".repeat(RULE_WIDE);
    let _ = writeln!(out, "{wide}");
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "{wide}");
    let _ = writeln!(
        out,
        "Analyzed: {} | Skipped: {} | Failed: {} | Total: {}",
        report.analyzed,
        report.skipped,
        report.failed,
        report.total()
    );

    let with_news: Vec<(&str, usize)> = report
        .outcomes
        .iter()
        .filter_map(|o| {
            o.detail
                .as_ref()
                .map(|d| (o.company_name.as_str(), d.news_count))
        })
        .filter(|(_, n)| *n > 0)
        .collect();
    let total_news: usize = with_news.iter().map(|(_, n)| n).sum();
    let _ = writeln!(out, "News analyzed: {total_news}");
    let _ = writeln!(out, "Companies with news: {}", with_news.len());
    if let Some((name, count)) = with_news.iter().max_by_key(|(_, n)| *n) {
        let _ = writeln!(out, "Busiest company: {name} ({count} news)");
    }

    if report.has_persistence_failures() {
        let _ = writeln!(out, "Persistence failures: {}", report.persistence_errors.len());
        for failure in &report.persistence_errors {
            let _ = writeln!(out, "  - {}: {}", failure.company_name, failure.message);
        }
    }
}

fn truncate_quote(quote: &str) -> String {
    if quote.chars().count() > QUOTE_CHARS {
        let head: String = quote.chars().take(QUOTE_CHARS).collect();
        format!("{head}...")
    } else {
        quote.to_string()
    }
}

/// Render the `--dry-run` listing.
pub(crate) fn render_selection(selected: &[Selection], considered: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {considered} companies would be analyzed",
        selected.len()
    );
    for s in selected {
        let last = s
            .record
            .last_article_count
            .map_or_else(|| "never".to_string(), |n| n.to_string());
        let _ = writeln!(
            out,
            "  - {} (last analyzed at {last}, now {})",
            s.record.name, s.observed_count_at_start
        );
    }
    out
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
