use std::sync::Arc;
use std::time::Instant;

use ratecast_core::{
    CurrencyCode, EnvelopeError, FeedError, FixtureFeed, HistoryRequest, LatestRequest, NbpFeed,
    RateFeed, RateRecord, UtcDateTime,
};
use ratecast_pipeline::PipelineConfig;
use ratecast_warehouse::{RateRow, Warehouse};
use serde_json::json;
use uuid::Uuid;

use crate::cli::{FeedSelector, SyncArgs};
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SyncArgs, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let feed: Arc<dyn RateFeed> = match args.feed {
        FeedSelector::Nbp => Arc::new(NbpFeed::default()),
        FeedSelector::Fixture => Arc::new(FixtureFeed::default()),
    };

    let currencies = resolve_currencies(args)?;

    let started = Instant::now();
    let (fetched, range_label) = if args.latest {
        let request = LatestRequest::new(currencies)
            .map_err(|error| CliError::Command(error.to_string()))?;
        (feed.latest(&request).await, String::from("latest"))
    } else {
        let start = args
            .start
            .as_deref()
            .ok_or_else(|| CliError::Command(String::from("--start is required without --latest")))?;
        let start = UtcDateTime::parse_date(start)?;
        let end = match &args.end {
            Some(end) => UtcDateTime::parse_date(end)?,
            None => UtcDateTime::now(),
        };

        let request = HistoryRequest::new(currencies, start, end)
            .map_err(|error| CliError::Command(error.to_string()))?;
        let label = format!("{}..{}", start.date_string(), end.date_string());
        (feed.history(&request).await, label)
    };

    match fetched {
        Ok(records) => {
            let rows = to_rate_rows(&records);
            let latency_ms = elapsed_ms(started);
            let inserted = warehouse.ingest_rates(
                feed.id().as_str(),
                &Uuid::new_v4().to_string(),
                &rows,
                latency_ms,
            )?;

            let data = json!({
                "feed": feed.id(),
                "range": range_label,
                "records_ingested": inserted,
            });

            Ok(CommandResult::ok(data, vec![feed.id()])
                .with_latency(latency_ms)
                .with_cache_hit(false))
        }
        Err(error) => Ok(sync_failure(feed.id(), &error, &range_label, elapsed_ms(started))),
    }
}

fn sync_failure(
    feed_id: ratecast_core::FeedId,
    error: &FeedError,
    range_label: &str,
    latency_ms: u64,
) -> CommandResult {
    let envelope_error = EnvelopeError::new(error.code(), error.message())
        .expect("feed error code/message are non-empty")
        .with_retryable(error.retryable())
        .with_source(feed_id);

    let data = json!({
        "feed": feed_id,
        "range": range_label,
        "records_ingested": 0,
    });

    CommandResult::ok(data, vec![feed_id])
        .with_errors(vec![envelope_error])
        .with_warning(format!("sync failed for feed '{feed_id}'"))
        .with_latency(latency_ms)
        .with_cache_hit(false)
}

fn to_rate_rows(records: &[RateRecord]) -> Vec<RateRow> {
    records
        .iter()
        .map(|record| RateRow {
            currency: record.currency.to_string(),
            date: record.ts.date_string(),
            rate: record.rate,
        })
        .collect()
}

fn resolve_currencies(args: &SyncArgs) -> Result<Vec<CurrencyCode>, CliError> {
    let raw = if args.currencies.is_empty() {
        PipelineConfig::default().currencies
    } else {
        args.currencies.clone()
    };

    raw.iter()
        .map(|value| CurrencyCode::parse(value).map_err(CliError::from))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
