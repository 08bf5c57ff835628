//! `fomo runs`: inspect the run ledger.

use std::fmt::Write as _;

use fomo_db::{AnalysisRunCompanyRow, AnalysisRunRow};

pub(crate) async fn runs_command(
    pool: &sqlx::PgPool,
    limit: i64,
    run_id: Option<i64>,
) -> anyhow::Result<()> {
    match run_id {
        Some(id) => {
            let run = fomo_db::get_analysis_run(pool, id).await?;
            let companies = fomo_db::list_analysis_run_companies(pool, id).await?;
            print!("{}", render_run_detail(&run, &companies));
        }
        None => {
            let runs = fomo_db::list_analysis_runs(pool, limit).await?;
            print!("{}", render_run_list(&runs));
        }
    }
    Ok(())
}

fn run_line(run: &AnalysisRunRow) -> String {
    let started = run
        .started_at
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "#{} {} [{}] trigger={} started={} analyzed={} skipped={} failed={}",
        run.id,
        run.public_id,
        run.status,
        run.trigger_source,
        started,
        run.analyzed_count,
        run.skipped_count,
        run.failed_count
    )
}

pub(crate) fn render_run_list(runs: &[AnalysisRunRow]) -> String {
    if runs.is_empty() {
        return "no analysis runs recorded\n".to_string();
    }
    let mut out = String::new();
    for run in runs {
        let _ = writeln!(out, "{}", run_line(run));
    }
    out
}

pub(crate) fn render_run_detail(run: &AnalysisRunRow, companies: &[AnalysisRunCompanyRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", run_line(run));
    let _ = writeln!(
        out,
        "window={}h company={} save_to_db={}",
        run.hours,
        run.company_filter.as_deref().unwrap_or("all"),
        run.save_to_db
    );
    if let Some(message) = &run.error_message {
        let _ = writeln!(out, "error: {message}");
    }
    for row in companies {
        let observed = row
            .observed_count_at_start
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let _ = write!(
            out,
            "  company {} [{}] observed={observed} recorded={}",
            row.company_id, row.status, row.recorded
        );
        if let Some(message) = &row.error_message {
            let _ = write!(out, " ({message})");
        }
        out.push('\n');
    }
    out
}
