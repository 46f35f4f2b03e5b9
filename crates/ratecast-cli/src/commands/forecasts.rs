use ratecast_warehouse::Warehouse;
use serde_json::json;

use crate::cli::ForecastsArgs;
use crate::error::CliError;

use super::{registered_feeds, CommandResult};

pub fn run(args: &ForecastsArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let run_date = resolve_run_date(args.run_date.as_deref(), warehouse)?;
    let forecasts = warehouse.load_forecasts(&run_date)?;
    let empty = forecasts.is_empty();

    let mut result = CommandResult::ok(
        json!({
            "run_date": &run_date,
            "forecasts": forecasts,
        }),
        registered_feeds(),
    );
    if empty {
        result = result.with_warning(format!("no forecasts stored for run date {run_date}"));
    }

    Ok(result)
}

pub(super) fn resolve_run_date(
    requested: Option<&str>,
    warehouse: &Warehouse,
) -> Result<String, CliError> {
    match requested {
        Some(run_date) => Ok(run_date.to_owned()),
        None => warehouse
            .last_successful_run()?
            .ok_or_else(|| CliError::Command(String::from("no completed run exists yet"))),
    }
}
