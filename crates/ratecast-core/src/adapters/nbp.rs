use std::time::Duration;

use serde::Deserialize;

use crate::feed::{
    FeedFuture, FeedHealth, FeedId, HistoryRequest, LatestRequest, RateFeed, RateRecord,
};
use crate::throttling::{BackoffPolicy, FeedThrottle};
use crate::{CurrencyCode, FeedError, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://api.nbp.pl/api";

/// Exchange-rate tables published by the feed; mid rates live in A and B.
const TABLES: [&str; 2] = ["a", "b"];

/// HTTP adapter for the National Bank of Poland exchange-rate API.
///
/// Fetches table A/B mid rates per calendar day. Days without a published
/// table (weekends, holidays) return 404 and are skipped, which is why the
/// series store applies its gap-fill policy downstream.
pub struct NbpFeed {
    client: reqwest::Client,
    base_url: String,
    throttle: FeedThrottle,
}

impl Default for NbpFeed {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl NbpFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            throttle: FeedThrottle::new(Duration::from_secs(1), 5, BackoffPolicy::default()),
        }
    }

    async fn acquire_budget(&self) -> Result<(), FeedError> {
        let mut attempt = 0;
        loop {
            match self.throttle.acquire(attempt) {
                Ok(()) => return Ok(()),
                Err(delay) => {
                    if self.throttle.retry_delay(attempt).is_none() {
                        return Err(FeedError::rate_limited(
                            "feed request budget exhausted after retries",
                        ));
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Fetch one table document; `Ok(None)` when the feed has no data for
    /// that day (HTTP 404).
    async fn fetch_table(&self, url: &str) -> Result<Option<Vec<NbpTable>>, FeedError> {
        self.acquire_budget().await?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FeedError::unavailable(format!("feed request failed: {error}")))?;

        match response.status() {
            status if status.as_u16() == 404 => Ok(None),
            status if status.as_u16() == 429 => {
                Err(FeedError::rate_limited("feed returned HTTP 429"))
            }
            status if !status.is_success() => Err(FeedError::unavailable(format!(
                "feed returned HTTP {status}"
            ))),
            _ => {
                let body = response.text().await.map_err(|error| {
                    FeedError::unavailable(format!("failed to read feed response: {error}"))
                })?;
                decode_tables(&body).map(Some)
            }
        }
    }

    fn table_url(&self, table: &str, date: Option<&str>) -> String {
        match date {
            Some(date) => format!(
                "{}/exchangerates/tables/{}/{}/?format=json",
                self.base_url, table, date
            ),
            None => format!("{}/exchangerates/tables/{}?format=json", self.base_url, table),
        }
    }
}

impl RateFeed for NbpFeed {
    fn id(&self) -> FeedId {
        FeedId::Nbp
    }

    fn history<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, Vec<RateRecord>> {
        Box::pin(async move {
            let mut records = Vec::new();
            let days = req.start.days_until(req.end);

            for table in TABLES {
                for offset in 0..=days {
                    let date = req.start.plus_days(offset).date_string();
                    let url = self.table_url(table, Some(date.as_str()));
                    let Some(tables) = self.fetch_table(url.as_str()).await? else {
                        continue;
                    };
                    collect_records(&tables, &req.currencies, &mut records)?;
                }
            }

            records.sort_by(|left, right| {
                left.currency
                    .cmp(&right.currency)
                    .then(left.ts.cmp(&right.ts))
            });
            Ok(records)
        })
    }

    fn latest<'a>(&'a self, req: &'a LatestRequest) -> FeedFuture<'a, Vec<RateRecord>> {
        Box::pin(async move {
            let mut records = Vec::new();

            for table in TABLES {
                let url = self.table_url(table, None);
                let Some(tables) = self.fetch_table(url.as_str()).await? else {
                    continue;
                };
                collect_records(&tables, &req.currencies, &mut records)?;
            }

            Ok(records)
        })
    }

    fn health(&self) -> FeedHealth {
        FeedHealth::Healthy
    }
}

#[derive(Debug, Deserialize)]
struct NbpTable {
    #[serde(rename = "effectiveDate")]
    effective_date: String,
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    code: String,
    mid: f64,
}

fn decode_tables(body: &str) -> Result<Vec<NbpTable>, FeedError> {
    serde_json::from_str(body)
        .map_err(|error| FeedError::decode(format!("unexpected feed payload: {error}")))
}

fn collect_records(
    tables: &[NbpTable],
    requested: &[CurrencyCode],
    records: &mut Vec<RateRecord>,
) -> Result<(), FeedError> {
    for table in tables {
        let ts = UtcDateTime::parse_date(&table.effective_date).map_err(|_| {
            FeedError::decode(format!(
                "feed effectiveDate is not a date: '{}'",
                table.effective_date
            ))
        })?;

        for rate in &table.rates {
            let Ok(currency) = CurrencyCode::parse(&rate.code) else {
                // Table B carries a few non-ISO entries; they are not requestable.
                continue;
            };
            if !requested.contains(&currency) {
                continue;
            }

            records.push(RateRecord {
                currency,
                ts,
                rate: rate.mid,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_BODY: &str = r#"[
        {
            "table": "A",
            "no": "001/A/NBP/2026",
            "effectiveDate": "2026-01-02",
            "rates": [
                {"currency": "euro", "code": "EUR", "mid": 4.2631},
                {"currency": "dolar amerykański", "code": "USD", "mid": 3.9876}
            ]
        }
    ]"#;

    #[test]
    fn decodes_table_payload() {
        let tables = decode_tables(TABLE_BODY).expect("decode");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].effective_date, "2026-01-02");
        assert_eq!(tables[0].rates.len(), 2);
    }

    #[test]
    fn collects_only_requested_currencies() {
        let tables = decode_tables(TABLE_BODY).expect("decode");
        let requested = vec![CurrencyCode::parse("EUR").expect("code")];
        let mut records = Vec::new();

        collect_records(&tables, &requested, &mut records).expect("collect");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].currency.as_str(), "EUR");
        assert_eq!(records[0].rate, 4.2631);
        assert_eq!(records[0].ts.date_string(), "2026-01-02");
    }

    #[test]
    fn rejects_malformed_payload() {
        let err = decode_tables("{\"not\": \"a table\"}").expect_err("must fail");
        assert_eq!(err.code(), "feed.decode");
    }

    #[test]
    fn builds_dated_and_current_urls() {
        let feed = NbpFeed::new("https://example.test/api");
        assert_eq!(
            feed.table_url("a", Some("2026-01-02")),
            "https://example.test/api/exchangerates/tables/a/2026-01-02/?format=json"
        );
        assert_eq!(
            feed.table_url("b", None),
            "https://example.test/api/exchangerates/tables/b?format=json"
        );
    }
}
