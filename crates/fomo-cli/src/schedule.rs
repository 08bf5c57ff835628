//! Cron-driven runs.
//!
//! Each tick runs the full pipeline for all companies. A tick that fires
//! while the previous run is still going is skipped, so runs never overlap.

use std::sync::Arc;

use fomo_core::{AppConfig, RunParams};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::run::execute_run;

pub(crate) async fn run_schedule(
    pool: PgPool,
    config: AppConfig,
    cron: Option<String>,
    hours: u32,
) -> anyhow::Result<()> {
    let params = RunParams::new(hours, None, true)?;
    fomo_db::run_migrations(&pool).await?;

    let cron = cron.unwrap_or_else(|| config.schedule_cron.clone());
    let mut scheduler = build_scheduler(pool, Arc::new(config), &cron, params).await?;
    tracing::info!(cron = %cron, hours, "scheduler started; press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

/// Builds and starts a scheduler with the analysis job registered.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if `cron` is not a valid expression or the
/// scheduler fails to start.
async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    cron: &str,
    params: RunParams,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    scheduler.add(analysis_job(pool, config, cron, params)?).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

fn analysis_job(
    pool: PgPool,
    config: Arc<AppConfig>,
    cron: &str,
    params: RunParams,
) -> Result<Job, JobSchedulerError> {
    let pool = Arc::new(pool);
    let params = Arc::new(params);
    let in_flight = Arc::new(Mutex::new(()));

    Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let params = Arc::clone(&params);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!("scheduler: previous run still in progress; skipping tick");
                return;
            };
            tracing::info!("scheduler: starting analysis run");
            run_scheduled(&pool, &config, &params).await;
        })
    })
}

async fn run_scheduled(pool: &PgPool, config: &AppConfig, params: &RunParams) {
    let artifact_dir = config.output_dir.clone();
    match execute_run(pool, config, params, "scheduler", Some(&artifact_dir)).await {
        Ok(completed) => {
            let report = &completed.report;
            tracing::info!(
                analyzed = report.analyzed,
                skipped = report.skipped,
                failed = report.failed,
                "scheduler: analysis run complete"
            );
            if let Some(failure) = completed.failure {
                tracing::error!(error = %failure, "scheduler: run finished with failures");
            }
        }
        Err(e) => tracing::error!(error = %format!("{e:#}"), "scheduler: analysis run failed"),
    }
}
