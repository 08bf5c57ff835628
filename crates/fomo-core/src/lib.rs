//! Core domain for the FOMO news digest job.
//!
//! Holds the company model, the change-detection gate that decides which
//! companies need a fresh analysis, the capability traits for the external
//! store and analyzer, and the run orchestration that ties them together.

pub mod analysis;
mod app_config;
pub mod company;
mod config;
pub mod gate;
pub mod run;
pub mod store;

use thiserror::Error;

pub use analysis::{AnalysisReport, Citation, Digest, ReportStatus, SourceRef, Summary, Topic};
pub use app_config::{AppConfig, Environment};
pub use company::{AnalysisOutcome, CompanyRecord, OutcomeStatus};
pub use config::{load_app_config, load_app_config_from_env};
pub use gate::{gate_decision, record_completed, select_for_analysis, GateDecision, Selection};
pub use run::{
    find_company, run_gate, PersistenceFailure, RunError, RunParams, RunReport, DEFAULT_HOURS,
    MAX_HOURS,
};
pub use store::{Analyzer, CompanyStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
