use ratecast_warehouse::Warehouse;
use serde_json::json;

use crate::cli::RecommendationsArgs;
use crate::error::CliError;

use super::forecasts::resolve_run_date;
use super::{registered_feeds, CommandResult};

pub fn run(args: &RecommendationsArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let run_date = resolve_run_date(args.run_date.as_deref(), warehouse)?;
    let recommendations = warehouse.load_recommendations(&run_date)?;
    let empty = recommendations.is_empty();

    let mut result = CommandResult::ok(
        json!({
            "run_date": &run_date,
            "recommendations": recommendations,
        }),
        registered_feeds(),
    );
    if empty {
        result =
            result.with_warning(format!("no recommendations stored for run date {run_date}"));
    }

    Ok(result)
}
