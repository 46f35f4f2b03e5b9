use ratecast_warehouse::{QueryGuardrails, Warehouse};

use crate::cli::SqlArgs;
use crate::error::CliError;

use super::{registered_feeds, CommandResult};

pub fn run(args: &SqlArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };

    let result = warehouse
        .execute_query(&args.query, guardrails, args.write)
        .map_err(|error| CliError::Command(error.to_string()))?;

    let truncated = result.truncated;
    let mut command_result =
        CommandResult::ok(serde_json::to_value(result)?, registered_feeds());
    if truncated {
        command_result = command_result
            .with_warning(format!("result truncated at {} row(s)", args.max_rows));
    }

    Ok(command_result)
}
