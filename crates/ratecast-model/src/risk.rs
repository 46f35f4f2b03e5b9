use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};
use thiserror::Error;

use ratecast_core::ValidationError;

use crate::trainer::ValidationPair;

/// Bounded-below risk scalar derived from held-out prediction error.
///
/// Equal to the model's RMAPE as a ratio: strictly increasing in relative
/// prediction error, 0 only for a model with zero held-out error.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RiskIndicator(f64);

impl RiskIndicator {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidRiskIndicator { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering for ranking; the inner value is always finite.
    pub fn total_cmp(self, other: Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Display for RiskIndicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl Serialize for RiskIndicator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("risk undefined: no held-out point has a non-zero actual value")]
    Undefined,
}

/// Risk score plus the bookkeeping the output tables report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScore {
    pub indicator: RiskIndicator,
    pub included_points: usize,
    pub skipped_zero_actuals: usize,
}

/// Compute RMAPE over held-out validation pairs.
///
/// Per point: `r = |actual - predicted| / |actual|`. Points with a zero
/// actual are excluded from the mean and counted separately. Fails with
/// [`RiskError::Undefined`] when no point has a non-zero actual.
pub fn score(validation: &[ValidationPair]) -> Result<RiskScore, RiskError> {
    let mut sum = 0.0;
    let mut included = 0usize;
    let mut skipped = 0usize;

    for pair in validation {
        if pair.actual == 0.0 {
            skipped += 1;
            continue;
        }
        sum += (pair.actual - pair.predicted).abs() / pair.actual.abs();
        included += 1;
    }

    if included == 0 {
        return Err(RiskError::Undefined);
    }

    let indicator = RiskIndicator::new(sum / included as f64)
        .expect("mean of finite non-negative terms is finite and non-negative");

    Ok(RiskScore {
        indicator,
        included_points: included,
        skipped_zero_actuals: skipped,
    })
}
