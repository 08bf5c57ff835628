//! The `run` command and the run pipeline shared with the scheduler.
//!
//! Every run is bracketed by an `analysis_runs` ledger row (queued, running,
//! then succeeded or failed) with one `analysis_run_companies` row per
//! company outcome.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args};
use fomo_analysis::{AnalysisConfig, NewsPipeline};
use fomo_core::{
    find_company, run_gate, select_for_analysis, AppConfig, CompanyRecord, RunError, RunParams,
    RunReport,
};
use fomo_db::{PgCompanyStore, RunCounts};

use crate::{artifact, report};

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Lookback window in hours
    #[arg(long, default_value_t = fomo_core::DEFAULT_HOURS)]
    pub hours: u32,

    /// Analyze only this company (by name)
    #[arg(long)]
    pub company: Option<String>,

    /// Write summaries and advance counters; `false` previews without writing
    #[arg(long = "save-db", default_value_t = true, action = ArgAction::Set)]
    pub save_db: bool,

    /// Directory for the JSON artifact (defaults to FOMO_OUTPUT_DIR)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip writing the JSON artifact
    #[arg(long)]
    pub no_artifact: bool,

    /// List the companies the gate would select, then exit without analyzing
    #[arg(long)]
    pub dry_run: bool,
}

/// Result of [`execute_run`]. `failure` is set when the run completed but
/// must still be reported as failed.
pub(crate) struct CompletedRun {
    pub report: RunReport,
    pub artifact: Option<PathBuf>,
    pub failure: Option<String>,
}

pub(crate) async fn run_command(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let params = RunParams::new(args.hours, args.company.clone(), args.save_db)?;
    fomo_db::run_migrations(pool).await?;

    if args.dry_run {
        return dry_run(pool, &params).await;
    }

    let artifact_dir = if args.no_artifact {
        None
    } else {
        Some(args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone()))
    };

    let completed = execute_run(pool, config, &params, "cli", artifact_dir.as_deref()).await?;

    print!("{}", report::render_report(&completed.report));
    if let Some(path) = &completed.artifact {
        println!("\nartifact: {}", path.display());
    }

    if let Some(failure) = completed.failure {
        anyhow::bail!(failure);
    }
    Ok(())
}

async fn dry_run(pool: &sqlx::PgPool, params: &RunParams) -> anyhow::Result<()> {
    let companies: Vec<CompanyRecord> = fomo_db::list_companies(pool)
        .await?
        .into_iter()
        .map(CompanyRecord::from)
        .collect();

    let companies = dry_run_candidates(companies, params)?;
    let selected = select_for_analysis(&companies);
    print!("{}", report::render_selection(&selected, companies.len()));
    Ok(())
}

/// The companies a real run would consider, resolving the company override
/// the same way `run_gate` does.
fn dry_run_candidates(
    companies: Vec<CompanyRecord>,
    params: &RunParams,
) -> Result<Vec<CompanyRecord>, RunError> {
    match params.company.as_deref() {
        Some(name) => Ok(vec![find_company(companies, name)?]),
        None => Ok(companies),
    }
}

/// Run the gate end to end: open the ledger row, analyze, record outcomes,
/// and write the artifact.
///
/// Persistence failures, missing per-company ledger rows, and artifact write
/// failures do not abort the run;
/// they mark the ledger row failed and are returned in
/// [`CompletedRun::failure`].
///
/// # Errors
///
/// Returns an error if the pipeline cannot be configured, the ledger row
/// cannot be opened, or the company list cannot be read.
pub(crate) async fn execute_run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    params: &RunParams,
    trigger: &'static str,
    artifact_dir: Option<&Path>,
) -> anyhow::Result<CompletedRun> {
    let analysis_config = AnalysisConfig::from_app_config(config)?;
    let pipeline = NewsPipeline::new(&analysis_config, pool.clone())?;
    let store = PgCompanyStore::new(pool.clone());

    let run = fomo_db::create_analysis_run(pool, trigger, params).await?;
    if let Err(e) = fomo_db::start_analysis_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, RunCounts::default(), format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(run_id = run.id, public_id = %run.public_id, trigger, "analysis run started");

    let report = match run_gate(&store, &pipeline, params).await {
        Ok(report) => report,
        Err(e) => {
            fail_run_best_effort(pool, run.id, RunCounts::default(), e.to_string()).await;
            return Err(e.into());
        }
    };

    let mut ledger_failures = Vec::new();
    for outcome in &report.outcomes {
        if let Err(e) = fomo_db::upsert_analysis_run_company(pool, run.id, outcome).await {
            tracing::error!(
                run_id = run.id,
                company = %outcome.company_name,
                error = %e,
                "failed to record company outcome"
            );
            ledger_failures.push(outcome.company_name.clone());
        }
    }

    let mut artifact_error = None;
    let artifact = match artifact_dir.map(|dir| artifact::write_artifact(dir, &report)) {
        Some(Ok(path)) => {
            tracing::info!(path = %path.display(), "artifact written");
            Some(path)
        }
        Some(Err(e)) => {
            tracing::error!(error = %format!("{e:#}"), "artifact write failed");
            artifact_error = Some(format!("{e:#}"));
            None
        }
        None => None,
    };

    let failure = run_failure(&report, &ledger_failures, artifact_error.as_deref());
    let counts = RunCounts::from_report(&report);
    match &failure {
        Some(message) => fail_run_best_effort(pool, run.id, counts, message.clone()).await,
        None => fomo_db::complete_analysis_run(pool, run.id, counts).await?,
    }

    Ok(CompletedRun {
        report,
        artifact,
        failure,
    })
}

/// Everything that makes an otherwise completed run count as failed, joined
/// into one message. `None` when the run is clean.
fn run_failure(
    report: &RunReport,
    ledger_failures: &[String],
    artifact_error: Option<&str>,
) -> Option<String> {
    let mut problems = Vec::new();

    if report.has_persistence_failures() {
        let companies: Vec<&str> = report
            .persistence_errors
            .iter()
            .map(|f| f.company_name.as_str())
            .collect();
        problems.push(format!(
            "failed to persist results for {} company(ies): {}",
            companies.len(),
            companies.join(", ")
        ));
    }
    if !ledger_failures.is_empty() {
        problems.push(format!(
            "failed to record ledger rows for {} company(ies): {}",
            ledger_failures.len(),
            ledger_failures.join(", ")
        ));
    }
    if let Some(e) = artifact_error {
        problems.push(format!("artifact write failed: {e}"));
    }

    if problems.is_empty() {
        None
    } else {
        Some(problems.join("; "))
    }
}

async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, counts: RunCounts, message: String) {
    if let Err(mark_err) = fomo_db::fail_analysis_run(pool, run_id, counts, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark analysis run as failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fomo_core::PersistenceFailure;

    fn empty_report() -> RunReport {
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            params: RunParams::default(),
            analyzed: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
            persistence_errors: Vec::new(),
        }
    }

    #[test]
    fn clean_run_has_no_failure() {
        assert_eq!(run_failure(&empty_report(), &[], None), None);
    }

    #[test]
    fn missing_ledger_rows_fail_the_run() {
        let failure = run_failure(&empty_report(), &["Acme".to_string()], None).unwrap();
        assert_eq!(
            failure,
            "failed to record ledger rows for 1 company(ies): Acme"
        );
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut report = empty_report();
        report.persistence_errors.push(PersistenceFailure {
            company_id: 2,
            company_name: "Beta".to_string(),
            message: "summary write failed: timeout".to_string(),
        });

        let failure = run_failure(&report, &["Acme".to_string()], Some("disk full")).unwrap();
        assert!(failure.starts_with("failed to persist results for 1 company(ies): Beta"));
        assert!(failure.contains("; failed to record ledger rows for 1 company(ies): Acme"));
        assert!(failure.ends_with("; artifact write failed: disk full"));
    }

    #[test]
    fn dry_run_override_matches_the_real_run() {
        let companies = vec![
            CompanyRecord::new(1, "Acme", Some(3), Some(1)),
            CompanyRecord::new(2, "ACME", Some(5), Some(5)),
            CompanyRecord::new(3, "Beta", Some(2), None),
        ];

        let params = RunParams::new(24, Some("Acme".to_string()), true).unwrap();
        let picked = dry_run_candidates(companies.clone(), &params).unwrap();
        assert_eq!(picked.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);

        let params = RunParams::new(24, Some("beta".to_string()), true).unwrap();
        let picked = dry_run_candidates(companies.clone(), &params).unwrap();
        assert_eq!(picked.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);

        let picked = dry_run_candidates(companies, &RunParams::default()).unwrap();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn dry_run_unknown_company_is_an_error() {
        let params = RunParams::new(24, Some("Globex".to_string()), true).unwrap();
        let result = dry_run_candidates(vec![CompanyRecord::new(1, "Acme", Some(1), None)], &params);
        assert!(matches!(result, Err(RunError::CompanyNotFound(_))));
    }
}
