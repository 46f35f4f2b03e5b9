use ratecast_core::{FixtureFeed, NbpFeed, RateFeed};
use serde_json::json;

use crate::cli::FeedsArgs;
use crate::error::CliError;

use super::{registered_feeds, CommandResult};

pub fn run(args: &FeedsArgs) -> Result<CommandResult, CliError> {
    let feeds: Vec<Box<dyn RateFeed>> =
        vec![Box::new(NbpFeed::default()), Box::new(FixtureFeed::default())];

    let rows: Vec<serde_json::Value> = feeds
        .iter()
        .map(|feed| {
            if args.verbose {
                json!({
                    "id": feed.id(),
                    "health": feed.health(),
                    "endpoints": ["history", "latest"],
                })
            } else {
                json!({
                    "id": feed.id(),
                    "health": feed.health(),
                })
            }
        })
        .collect();

    Ok(CommandResult::ok(json!({ "feeds": rows }), registered_feeds()))
}
