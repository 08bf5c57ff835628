mod artifact;
mod report;
mod run;
mod runs;
mod schedule;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fomo")]
#[command(about = "Change-gated news analysis for tracked companies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one analysis pass over companies whose article count changed
    Run(run::RunArgs),
    /// Check database, embedding model, and vector index connectivity
    Check,
    /// Run analysis passes on a cron schedule until interrupted
    Schedule {
        /// Six-field cron expression (defaults to FOMO_SCHEDULE_CRON)
        #[arg(long)]
        cron: Option<String>,

        /// Lookback window in hours for each scheduled run
        #[arg(long, default_value_t = fomo_core::DEFAULT_HOURS)]
        hours: u32,
    },
    /// List recent analysis runs, or show one run's per-company outcomes
    Runs {
        /// Number of runs to list
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Show a single run by id
        #[arg(long)]
        id: Option<i64>,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify the database connection
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("fomo: no command given; run `fomo --help` for usage");
        return Ok(());
    };

    let config = fomo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = fomo_db::PoolConfig::from_app_config(&config);
    let pool = fomo_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Run(args) => run::run_command(&pool, &config, &args).await,
        Commands::Check => check_command(&pool, &config).await,
        Commands::Schedule { cron, hours } => {
            schedule::run_schedule(pool, config, cron, hours).await
        }
        Commands::Runs { limit, id } => runs::runs_command(&pool, limit, id).await,
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            fomo_db::health_check(&pool).await?;
            println!("database: ok");
            Ok(())
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = fomo_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
            Ok(())
        }
    }
}

async fn check_command(pool: &sqlx::PgPool, config: &fomo_core::AppConfig) -> anyhow::Result<()> {
    fomo_db::health_check(pool).await?;
    println!("database: ok");

    let analysis_config = fomo_analysis::AnalysisConfig::from_app_config(config)?;
    fomo_analysis::check_connections(&analysis_config).await?;
    println!("embedding model: ok ({})", analysis_config.embedding_model);
    println!("vector index: ok ({})", analysis_config.pinecone_index_host);
    Ok(())
}
