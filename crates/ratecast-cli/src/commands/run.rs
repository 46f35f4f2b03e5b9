use std::fs;
use std::path::Path;

use ratecast_core::UtcDateTime;
use ratecast_pipeline::{Orchestrator, PipelineConfig};
use ratecast_warehouse::Warehouse;

use crate::cli::RunArgs;
use crate::error::CliError;

use super::{registered_feeds, CommandResult};

pub async fn run(args: &RunArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let as_of = UtcDateTime::parse_date(&args.as_of)?;
    let config = load_config(args.config.as_deref())?;

    let orchestrator = Orchestrator::new(warehouse.clone(), config)?;
    let report = orchestrator.run(as_of).await?;

    let warnings = report.warnings.clone();
    let cache_hit = report.cache_hit;
    let latency_ms = report.latency_ms;
    let data = serde_json::to_value(report)?;

    Ok(CommandResult::ok(data, registered_feeds())
        .with_warnings(warnings)
        .with_latency(latency_ms)
        .with_cache_hit(cache_hit))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, CliError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(CliError::from)
        }
        None => Ok(PipelineConfig::default()),
    }
}
