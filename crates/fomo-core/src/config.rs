use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FOMO_ENV", "development"));
    let log_level = or_default("FOMO_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("FOMO_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FOMO_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FOMO_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let google_api_key = optional("GOOGLE_API_KEY").or_else(|| optional("GEMINI_API_KEY"));
    let gemini_base_url = or_default(
        "FOMO_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/v1beta",
    );
    let embedding_model = or_default("FOMO_EMBEDDING_MODEL", "gemini-embedding-001");
    let generation_model = or_default("FOMO_GENERATION_MODEL", "gemini-2.0-flash-lite");
    let embedding_dim = parse_usize("FOMO_EMBEDDING_DIM", "768")?;

    let pinecone_api_key = optional("PINECONE_API_KEY");
    let pinecone_index_host = optional("PINECONE_INDEX_HOST");
    let search_top_k = parse_usize("FOMO_SEARCH_TOP_K", "50")?;
    if search_top_k == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FOMO_SEARCH_TOP_K".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let llm_max_retries = parse_u32("FOMO_LLM_MAX_RETRIES", "3")?;
    let llm_retry_backoff_ms = parse_u64("FOMO_LLM_RETRY_BACKOFF_MS", "1000")?;
    let request_timeout_secs = parse_u64("FOMO_REQUEST_TIMEOUT_SECS", "60")?;

    let output_dir = PathBuf::from(or_default("FOMO_OUTPUT_DIR", "./output"));
    let schedule_cron = or_default("FOMO_SCHEDULE_CRON", "0 0 * * * *");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        google_api_key,
        gemini_base_url,
        embedding_model,
        generation_model,
        embedding_dim,
        pinecone_api_key,
        pinecone_index_host,
        search_top_k,
        llm_max_retries,
        llm_retry_backoff_ms,
        request_timeout_secs,
        output_dir,
        schedule_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
