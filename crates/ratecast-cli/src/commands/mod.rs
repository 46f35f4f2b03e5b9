mod feeds;
mod forecasts;
mod recommendations;
mod run;
mod sql;
mod sync;

use ratecast_core::{Envelope, EnvelopeMeta, FeedId};
use ratecast_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<ratecast_core::EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub source_chain: Vec<FeedId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<FeedId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: true,
            source_chain,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<ratecast_core::EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let warehouse = open_warehouse(cli)?;

    let command_result = match &cli.command {
        Command::Sync(args) => sync::run(args, &warehouse).await?,
        Command::Run(args) => self::run::run(args, &warehouse).await?,
        Command::Forecasts(args) => forecasts::run(args, &warehouse)?,
        Command::Recommendations(args) => recommendations::run(args, &warehouse)?,
        Command::Sql(args) => sql::run(args, &warehouse)?,
        Command::Feeds(args) => feeds::run(args)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        cache_hit,
        source_chain,
    } = command_result;

    let mut meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        "v1.0.0",
        source_chain,
        latency_ms,
        cache_hit,
    )?;

    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn open_warehouse(cli: &Cli) -> Result<Warehouse, CliError> {
    let config = match &cli.db_path {
        Some(db_path) => WarehouseConfig {
            db_path: db_path.clone(),
            ..WarehouseConfig::default()
        },
        None => WarehouseConfig::default(),
    };
    Warehouse::open(config).map_err(CliError::from)
}

/// Chain reported by commands that only touch the warehouse: every feed the
/// stored history may have come from.
fn registered_feeds() -> Vec<FeedId> {
    FeedId::ALL.to_vec()
}
