//! Shared helpers for ratecast behavior tests.

use ratecast_core::{CurrencyCode, FixtureFeed, HistoryRequest, RateFeed, UtcDateTime};
use ratecast_pipeline::PipelineConfig;
use ratecast_warehouse::{RateRow, Warehouse, WarehouseConfig};

pub use std::sync::Arc;

/// Open a warehouse in a fresh temporary home directory.
pub fn open_temp_warehouse() -> (tempfile::TempDir, Warehouse) {
    let temp = tempfile::tempdir().expect("tempdir");
    let home = temp.path().join("ratecast-home");
    let warehouse = Warehouse::open(WarehouseConfig {
        db_path: home.join("warehouse.duckdb"),
        ratecast_home: home,
        max_pool_size: 2,
    })
    .expect("warehouse open");
    (temp, warehouse)
}

/// Ingest `days` of deterministic fixture history per currency, ending at
/// `end` (YYYY-MM-DD) inclusive.
pub async fn seed_fixture_history(warehouse: &Warehouse, currencies: &[&str], days: i64, end: &str) {
    let feed = FixtureFeed::default();
    let end = UtcDateTime::parse_date(end).expect("end date");
    let request = HistoryRequest::new(
        currencies
            .iter()
            .map(|code| CurrencyCode::parse(code).expect("currency"))
            .collect(),
        end.plus_days(-(days - 1)),
        end,
    )
    .expect("request");

    let records = feed.history(&request).await.expect("fixture history");
    let rows: Vec<RateRow> = records
        .iter()
        .map(|record| RateRow {
            currency: record.currency.to_string(),
            date: record.ts.date_string(),
            rate: record.rate,
        })
        .collect();

    warehouse
        .ingest_rates("fixture", &uuid::Uuid::new_v4().to_string(), &rows, 1)
        .expect("ingest");
}

/// Pipeline config restricted to the given currencies, defaults elsewhere.
pub fn config_for(currencies: &[&str]) -> PipelineConfig {
    PipelineConfig {
        currencies: currencies.iter().map(|code| String::from(*code)).collect(),
        ..PipelineConfig::default()
    }
}
