use crate::feed::{
    FeedFuture, FeedHealth, FeedId, HistoryRequest, LatestRequest, RateFeed, RateRecord,
};
use crate::{CurrencyCode, FeedError, UtcDateTime};

/// Deterministic in-process feed used by tests and offline runs.
///
/// The rate for a given (currency, date) pair is a pure function of both, so
/// repeated syncs over any overlapping range produce identical observations.
#[derive(Debug, Clone)]
pub struct FixtureFeed {
    health: FeedHealth,
}

impl Default for FixtureFeed {
    fn default() -> Self {
        Self {
            health: FeedHealth::Healthy,
        }
    }
}

impl FixtureFeed {
    pub fn with_health(health: FeedHealth) -> Self {
        Self { health }
    }

    fn record_for(currency: &CurrencyCode, ts: UtcDateTime) -> RateRecord {
        let seed = currency_seed(currency);
        let base = 1.0 + (seed % 500) as f64 / 100.0;

        let julian = ts.into_inner().date().to_julian_day() as u64;
        let wiggle = (seed.wrapping_add(julian.wrapping_mul(2_654_435_761)) % 200) as f64 / 1_000.0
            - 0.1;

        RateRecord {
            currency: currency.clone(),
            ts,
            rate: (base + wiggle).max(0.01),
        }
    }
}

impl RateFeed for FixtureFeed {
    fn id(&self) -> FeedId {
        FeedId::Fixture
    }

    fn history<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, Vec<RateRecord>> {
        Box::pin(async move {
            if self.health == FeedHealth::Unhealthy {
                return Err(FeedError::unavailable("fixture feed is marked unhealthy"));
            }

            let days = req.start.days_until(req.end);
            let mut records = Vec::new();
            for offset in 0..=days {
                let ts = req.start.plus_days(offset);
                for currency in &req.currencies {
                    records.push(Self::record_for(currency, ts));
                }
            }

            Ok(records)
        })
    }

    fn latest<'a>(&'a self, req: &'a LatestRequest) -> FeedFuture<'a, Vec<RateRecord>> {
        Box::pin(async move {
            if self.health == FeedHealth::Unhealthy {
                return Err(FeedError::unavailable("fixture feed is marked unhealthy"));
            }

            let today = UtcDateTime::now();
            Ok(req
                .currencies
                .iter()
                .map(|currency| Self::record_for(currency, today))
                .collect())
        })
    }

    fn health(&self) -> FeedHealth {
        self.health
    }
}

fn currency_seed(currency: &CurrencyCode) -> u64 {
    currency
        .as_str()
        .bytes()
        .fold(0u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> HistoryRequest {
        HistoryRequest::new(
            vec![CurrencyCode::parse("EUR").expect("code")],
            UtcDateTime::parse_date(start).expect("date"),
            UtcDateTime::parse_date(end).expect("date"),
        )
        .expect("request")
    }

    #[tokio::test]
    async fn produces_one_record_per_day() {
        let feed = FixtureFeed::default();
        let records = feed
            .history(&request("2026-01-01", "2026-01-10"))
            .await
            .expect("history");

        assert_eq!(records.len(), 10);
        for window in records.windows(2) {
            assert!(window[0].ts < window[1].ts);
        }
    }

    #[tokio::test]
    async fn identical_ranges_produce_identical_records() {
        let feed = FixtureFeed::default();
        let first = feed
            .history(&request("2026-01-01", "2026-01-05"))
            .await
            .expect("history");
        let second = feed
            .history(&request("2026-01-01", "2026-01-05"))
            .await
            .expect("history");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn overlapping_ranges_agree_on_shared_dates() {
        let feed = FixtureFeed::default();
        let wide = feed
            .history(&request("2026-01-01", "2026-01-10"))
            .await
            .expect("history");
        let narrow = feed
            .history(&request("2026-01-05", "2026-01-05"))
            .await
            .expect("history");

        assert!(wide.contains(&narrow[0]));
    }

    #[tokio::test]
    async fn latest_returns_one_record_per_currency() {
        let feed = FixtureFeed::default();
        let request = LatestRequest::new(vec![
            CurrencyCode::parse("EUR").expect("code"),
            CurrencyCode::parse("USD").expect("code"),
        ])
        .expect("request");

        let records = feed.latest(&request).await.expect("latest");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ts.date_string(), records[1].ts.date_string());
    }

    #[tokio::test]
    async fn unhealthy_feed_refuses_requests() {
        let feed = FixtureFeed::with_health(FeedHealth::Unhealthy);
        let err = feed
            .history(&request("2026-01-01", "2026-01-02"))
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), "feed.unavailable");
    }
}
