use thiserror::Error;

use crate::feed::RateRecord;
use crate::{CurrencyCode, RatePoint, RateSeries, UtcDateTime, ValidationError};

/// Series construction parameters owned by the orchestrator's configuration.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Minimum number of daily points required before a model may train.
    pub min_history: usize,
    /// Maximum consecutive missing daily periods the forward-fill policy
    /// covers; longer gaps are a `DataGap`.
    pub gap_fill_limit: usize,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("insufficient history: {available} point(s) available, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    #[error("data gap of {missing} day(s) before {at} exceeds the gap-fill limit of {limit}")]
    DataGap {
        missing: usize,
        at: String,
        limit: usize,
    },

    #[error("conflicting observations for {at}: {first} vs {second}")]
    ConflictingObservation { at: String, first: f64, second: f64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Normalize raw feed records into a validated daily [`RateSeries`].
///
/// Records after the as-of date are dropped. Missing daily periods inside the
/// observed range are forward-filled up to the configured limit; every fill is
/// counted on the returned series so downstream error computation can see it.
pub fn build_series(
    currency: &CurrencyCode,
    records: &[RateRecord],
    as_of: UtcDateTime,
    config: StoreConfig,
) -> Result<RateSeries, StoreError> {
    let mut observed: Vec<&RateRecord> = records
        .iter()
        .filter(|record| record.currency == *currency && record.ts <= as_of)
        .collect();
    observed.sort_by(|left, right| left.ts.cmp(&right.ts));

    for window in observed.windows(2) {
        if window[0].ts.days_until(window[1].ts) == 0 && window[0].rate != window[1].rate {
            return Err(StoreError::ConflictingObservation {
                at: window[1].ts.date_string(),
                first: window[0].rate,
                second: window[1].rate,
            });
        }
    }
    observed.dedup_by(|later, earlier| earlier.ts.days_until(later.ts) == 0);

    if observed.len() < config.min_history {
        return Err(StoreError::InsufficientHistory {
            available: observed.len(),
            required: config.min_history,
        });
    }

    let mut points = Vec::with_capacity(observed.len());
    let mut filled_gaps = 0usize;

    for pair in observed.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        points.push(RatePoint::new(previous.ts, previous.rate)?);

        let missing = previous.ts.days_until(next.ts) - 1;
        if missing <= 0 {
            continue;
        }

        let missing = missing as usize;
        if missing > config.gap_fill_limit {
            return Err(StoreError::DataGap {
                missing,
                at: next.ts.date_string(),
                limit: config.gap_fill_limit,
            });
        }

        // Forward-fill: carry the last observed rate across the gap.
        for day in 1..=missing {
            points.push(RatePoint::new(previous.ts.plus_days(day as i64), previous.rate)?);
            filled_gaps += 1;
        }
    }

    if let Some(last) = observed.last() {
        points.push(RatePoint::new(last.ts, last.rate)?);
    }

    Ok(RateSeries::new(currency.clone(), points, as_of)?.with_filled_gaps(filled_gaps))
}
