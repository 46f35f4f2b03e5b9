//! CLI argument definitions for ratecast.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sync` | Ingest rate history from an upstream feed |
//! | `run` | Execute the daily pipeline for an as-of date |
//! | `forecasts` | Read a run's forecast table |
//! | `recommendations` | Read a run's ranked recommendation table |
//! | `sql` | Query the local DuckDB warehouse |
//! | `feeds` | List registered feed adapters |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Daily exchange-rate forecasting with risk-ranked recommendations.
#[derive(Debug, Parser)]
#[command(
    name = "ratecast",
    author,
    version,
    about = "Exchange-rate forecasting and risk-ranked recommendations"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Warehouse database file; defaults to $RATECAST_HOME/warehouse.duckdb.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

/// Feed selection for `sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedSelector {
    /// National Bank of Poland exchange-rate API.
    Nbp,
    /// Deterministic in-process feed for tests and offline runs.
    Fixture,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest rate history from an upstream feed into the warehouse.
    ///
    /// # Examples
    ///
    ///   ratecast sync --start 2025-01-01
    ///   ratecast sync --latest
    ///   ratecast sync --feed fixture --currencies EUR GBP --start 2025-01-01 --end 2026-01-01
    Sync(SyncArgs),

    /// Run the daily pipeline for an as-of date.
    ///
    /// Re-invoking for a completed date serves the stored tables unchanged.
    ///
    /// # Examples
    ///
    ///   ratecast run 2026-08-06
    ///   ratecast run 2026-08-06 --config pipeline.json --strict
    Run(RunArgs),

    /// Read the forecast table for a run.
    Forecasts(ForecastsArgs),

    /// Read the ranked recommendation table for a run.
    Recommendations(RecommendationsArgs),

    /// Run SQL queries against the DuckDB warehouse.
    ///
    /// Default mode is read-only; use --write for data modifications.
    ///
    /// # Examples
    ///
    ///   ratecast sql "SELECT * FROM latest_recommendations"
    ///   ratecast sql "SELECT COUNT(*) FROM rates"
    Sql(SqlArgs),

    /// List registered feed adapters and their health.
    Feeds(FeedsArgs),
}

/// Arguments for the `sync` command.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Feed to ingest from.
    #[arg(long, value_enum, default_value_t = FeedSelector::Nbp)]
    pub feed: FeedSelector,

    /// Currencies to ingest; defaults to the configured pipeline set.
    #[arg(long, num_args = 1..)]
    pub currencies: Vec<String>,

    /// First day of history to fetch (YYYY-MM-DD). Required unless --latest.
    #[arg(long, required_unless_present = "latest")]
    pub start: Option<String>,

    /// Last day of history to fetch (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub end: Option<String>,

    /// Fetch only the most recent published observation per currency.
    #[arg(long, default_value_t = false)]
    pub latest: bool,
}

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// As-of date (YYYY-MM-DD) the run is keyed by.
    pub as_of: String,

    /// JSON pipeline configuration file; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `forecasts` command.
#[derive(Debug, Args)]
pub struct ForecastsArgs {
    /// Run date to read; the latest completed run when omitted.
    #[arg(long)]
    pub run_date: Option<String>,
}

/// Arguments for the `recommendations` command.
#[derive(Debug, Args)]
pub struct RecommendationsArgs {
    /// Run date to read; the latest completed run when omitted.
    #[arg(long)]
    pub run_date: Option<String>,
}

/// Arguments for the `sql` command.
#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write operations (INSERT, UPDATE, DELETE, CREATE, etc.).
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

/// Arguments for the `feeds` command.
#[derive(Debug, Args)]
pub struct FeedsArgs {
    /// Include adapter detail in the output.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}
