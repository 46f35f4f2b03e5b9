//! Daily pipeline orchestration for ratecast.
//!
//! Sequences the per-currency forecasting pipelines for one as-of date:
//! series construction, model training, risk scoring, and forecasting fan
//! out as independent tasks, the recommendation ranker waits for all of them,
//! and the run publishes all-or-nothing into the warehouse.

pub mod config;
pub mod orchestrator;
pub mod outcome;
pub mod ranker;

pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{
    build_output_tables, Orchestrator, OrchestratorError, RunReport, RunTables,
};
pub use outcome::{CurrencyOutcome, CurrencyStatus, ExclusionReason};
pub use ranker::{rank, summarize, ForecastSummary, RankCandidate, Recommendation};
