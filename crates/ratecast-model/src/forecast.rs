use serde::Serialize;
use thiserror::Error;

use ratecast_core::{CurrencyCode, UtcDateTime};

use crate::trainer::TrainedModel;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("forecast unavailable for '{currency}': {reason}")]
    Unavailable { currency: String, reason: String },
}

/// One predicted future rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub currency: CurrencyCode,
    pub target_ts: UtcDateTime,
    pub predicted_rate: f64,
    pub generated_at: UtcDateTime,
}

/// Lazy, finite forecast sequence.
///
/// Each step feeds the previous prediction back as the newest lag input, so
/// the sequence is generated once per run and cannot be restarted.
pub struct ForecastIter {
    model: TrainedModel,
    history: Vec<f64>,
    next_target: UtcDateTime,
    generated_at: UtcDateTime,
    remaining: usize,
}

impl Iterator for ForecastIter {
    type Item = ForecastPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let predicted = self.model.predict_next(&self.history);
        self.history.push(predicted);

        let point = ForecastPoint {
            currency: self.model.currency().clone(),
            target_ts: self.next_target,
            predicted_rate: predicted,
            generated_at: self.generated_at,
        };

        self.next_target = self.next_target.plus_days(1);
        self.remaining -= 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl TrainedModel {
    /// Forecast `horizon` daily periods starting the day after the training
    /// window end.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Unavailable`] when the model carries no
    /// usable state; a model that did not complete training can never
    /// silently produce stale predictions.
    pub fn forecast(&self, horizon: usize) -> Result<ForecastIter, ForecastError> {
        if self.state.len() < self.max_lag() || self.lag_coefficients.is_empty() {
            return Err(ForecastError::Unavailable {
                currency: self.currency().to_string(),
                reason: String::from("model state does not cover the configured lags"),
            });
        }

        Ok(ForecastIter {
            history: self.state.clone(),
            next_target: self.window_end().plus_days(1),
            generated_at: self.fitted_at(),
            remaining: horizon,
            model: self.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::{train, TrainerConfig};
    use ratecast_core::{RatePoint, RateSeries};

    fn model() -> TrainedModel {
        let start = UtcDateTime::parse_date("2025-01-01").expect("date");
        let mut values = vec![4.0];
        for index in 1..200 {
            let noise = ((index * 7_919) % 1_000) as f64 / 5_000.0 - 0.1;
            values.push(2.0 + 0.5 * values[index - 1] + noise);
        }

        let points: Vec<RatePoint> = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                RatePoint::new(start.plus_days(index as i64), *value).expect("point")
            })
            .collect();
        let series = RateSeries::new(
            CurrencyCode::parse("EUR").expect("code"),
            points,
            start.plus_days(200),
        )
        .expect("series");

        train(
            &series,
            &TrainerConfig::default(),
            UtcDateTime::parse_date("2025-07-20").expect("date"),
        )
        .expect("model")
    }

    #[test]
    fn yields_exactly_horizon_points() {
        let forecasts: Vec<ForecastPoint> =
            model().forecast(7).expect("iterator").collect();
        assert_eq!(forecasts.len(), 7);
    }

    #[test]
    fn targets_are_strictly_increasing_daily_from_window_end() {
        let model = model();
        let forecasts: Vec<ForecastPoint> = model.forecast(5).expect("iterator").collect();

        assert_eq!(
            forecasts[0].target_ts,
            model.window_end().plus_days(1)
        );
        for window in forecasts.windows(2) {
            assert_eq!(window[0].target_ts.plus_days(1), window[1].target_ts);
        }
    }

    #[test]
    fn predictions_are_finite() {
        for point in model().forecast(30).expect("iterator") {
            assert!(point.predicted_rate.is_finite());
        }
    }

    #[test]
    fn generation_timestamp_is_the_fit_timestamp() {
        let model = model();
        let point = model
            .forecast(1)
            .expect("iterator")
            .next()
            .expect("one point");
        assert_eq!(point.generated_at, model.fitted_at());
    }
}
