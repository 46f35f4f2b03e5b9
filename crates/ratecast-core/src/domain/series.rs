use serde::Serialize;

use crate::{CurrencyCode, UtcDateTime, ValidationError};

/// One observed exchange-rate value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePoint {
    pub ts: UtcDateTime,
    pub rate: f64,
}

impl RatePoint {
    pub fn new(ts: UtcDateTime, rate: f64) -> Result<Self, ValidationError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ValidationError::InvalidRate { value: rate });
        }
        Ok(Self { ts, rate })
    }
}

/// Time-ordered rate history for one currency.
///
/// Timestamps are strictly increasing and never exceed the as-of date the
/// series was built for. Immutable once constructed; a new run builds a new
/// series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSeries {
    currency: CurrencyCode,
    points: Vec<RatePoint>,
    /// Number of forward-filled points introduced by the gap-fill policy.
    filled_gaps: usize,
}

impl RateSeries {
    pub fn new(
        currency: CurrencyCode,
        points: Vec<RatePoint>,
        as_of: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        for (index, window) in points.windows(2).enumerate() {
            if window[1].ts <= window[0].ts {
                return Err(ValidationError::NonMonotonicSeries { index: index + 1 });
            }
        }

        if let Some(last) = points.last() {
            if last.ts > as_of {
                return Err(ValidationError::FutureDatedPoint {
                    ts: last.ts.format_rfc3339(),
                });
            }
        }

        Ok(Self {
            currency,
            points,
            filled_gaps: 0,
        })
    }

    /// Record how many points were forward-filled while building the series.
    pub fn with_filled_gaps(mut self, filled_gaps: usize) -> Self {
        self.filled_gaps = filled_gaps;
        self
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.rate).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn filled_gaps(&self) -> usize {
        self.filled_gaps
    }

    pub fn start_ts(&self) -> Option<UtcDateTime> {
        self.points.first().map(|point| point.ts)
    }

    pub fn end_ts(&self) -> Option<UtcDateTime> {
        self.points.last().map(|point| point.ts)
    }
}
