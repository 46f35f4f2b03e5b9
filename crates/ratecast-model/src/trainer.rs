use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use thiserror::Error;

use ratecast_core::{CurrencyCode, RateSeries, UtcDateTime};

/// Model hyperparameters recognized by the trainer.
#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    /// Number of consecutive lagged values used as regressors.
    pub lag_depth: usize,
    /// Seasonal lag added as an extra regressor when it exceeds `lag_depth`;
    /// 0 disables the seasonal term.
    pub seasonality_period: usize,
    /// Chronological train/validation split ratio, in (0, 1).
    pub split_ratio: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            lag_depth: 5,
            seasonality_period: 0,
            split_ratio: 0.8,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainError {
    #[error("training diverged: {0}")]
    Divergence(String),

    #[error("training window too short: {available} usable point(s), {required} required")]
    WindowTooShort { available: usize, required: usize },

    #[error("validation window is empty after the chronological split")]
    EmptyValidationWindow,

    #[error("split ratio must be within (0, 1), got {value}")]
    InvalidSplitRatio { value: f64 },

    #[error("lag depth must be greater than zero")]
    ZeroLagDepth,
}

/// One held-out observation and the model's one-step-ahead prediction for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationPair {
    pub actual: f64,
    pub predicted: f64,
}

impl ValidationPair {
    pub fn residual(&self) -> f64 {
        self.actual - self.predicted
    }
}

/// A fitted per-currency model. Produced fresh each run, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    currency: CurrencyCode,
    window_start: UtcDateTime,
    window_end: UtcDateTime,
    fitted_at: UtcDateTime,
    pub(crate) intercept: f64,
    pub(crate) lag_coefficients: Vec<f64>,
    pub(crate) seasonal_coefficient: Option<f64>,
    pub(crate) seasonality_period: usize,
    /// Most recent observed values, oldest first; long enough to cover the
    /// deepest lag the model reads.
    pub(crate) state: Vec<f64>,
    in_sample_residuals: Vec<f64>,
    validation: Vec<ValidationPair>,
}

impl TrainedModel {
    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn window_start(&self) -> UtcDateTime {
        self.window_start
    }

    pub fn window_end(&self) -> UtcDateTime {
        self.window_end
    }

    pub fn fitted_at(&self) -> UtcDateTime {
        self.fitted_at
    }

    pub fn in_sample_residuals(&self) -> &[f64] {
        &self.in_sample_residuals
    }

    pub fn validation(&self) -> &[ValidationPair] {
        &self.validation
    }

    pub(crate) fn max_lag(&self) -> usize {
        if self.seasonal_coefficient.is_some() {
            self.seasonality_period
        } else {
            self.lag_coefficients.len()
        }
    }

    /// One-step prediction from a window of past values, newest last.
    pub(crate) fn predict_next(&self, history: &[f64]) -> f64 {
        let n = history.len();
        let mut prediction = self.intercept;
        for (lag, coefficient) in self.lag_coefficients.iter().enumerate() {
            prediction += coefficient * history[n - 1 - lag];
        }
        if let Some(coefficient) = self.seasonal_coefficient {
            prediction += coefficient * history[n - self.seasonality_period];
        }
        prediction
    }
}

/// Fit a seasonal autoregressive model to one currency's series.
///
/// The series is split chronologically: coefficients are estimated by
/// ordinary least squares over the earlier segment, then one-step-ahead
/// predictions are generated over the held-out tail with residual =
/// actual - predicted per point.
pub fn train(
    series: &RateSeries,
    config: &TrainerConfig,
    fitted_at: UtcDateTime,
) -> Result<TrainedModel, TrainError> {
    if config.lag_depth == 0 {
        return Err(TrainError::ZeroLagDepth);
    }
    if !(config.split_ratio > 0.0 && config.split_ratio < 1.0) {
        return Err(TrainError::InvalidSplitRatio {
            value: config.split_ratio,
        });
    }

    // A seasonal lag at or below lag_depth is already covered by the
    // consecutive lag regressors.
    let seasonal = (config.seasonality_period > config.lag_depth)
        .then_some(config.seasonality_period);
    let max_lag = seasonal.unwrap_or(config.lag_depth);
    let num_params = 1 + config.lag_depth + usize::from(seasonal.is_some());

    let values = series.values();
    let n = values.len();
    let split = (n as f64 * config.split_ratio).floor() as usize;

    let train_rows = split.saturating_sub(max_lag);
    let required_rows = num_params + 2;
    if train_rows < required_rows {
        return Err(TrainError::WindowTooShort {
            available: train_rows,
            required: required_rows,
        });
    }
    if split >= n {
        return Err(TrainError::EmptyValidationWindow);
    }

    let train_target = &values[max_lag..split];
    let spread = train_target
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if spread.0 == spread.1 {
        return Err(TrainError::Divergence(String::from(
            "training segment has no variation",
        )));
    }

    // Design matrix over the training rows: [1, y_{t-1}..y_{t-lag}, y_{t-season}].
    let mut x_data = Vec::with_capacity(train_rows * num_params);
    for t in max_lag..split {
        x_data.extend(design_row(&values, t, config.lag_depth, seasonal));
    }

    let x = DMatrix::from_row_slice(train_rows, num_params, &x_data);
    let y = DVector::from_column_slice(train_target);

    // OLS via the normal equations: β = (X'X)⁻¹ X'y.
    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    let beta = xtx
        .try_inverse()
        .map(|inverse| inverse * xty)
        .ok_or_else(|| TrainError::Divergence(String::from("normal equations are singular")))?;

    if beta.iter().any(|value| !value.is_finite()) {
        return Err(TrainError::Divergence(String::from(
            "estimated coefficients are non-finite",
        )));
    }

    let intercept = beta[0];
    let lag_coefficients: Vec<f64> = beta.iter().skip(1).take(config.lag_depth).copied().collect();
    let seasonal_coefficient = seasonal.map(|_| beta[num_params - 1]);

    let fitted = &x * &beta;
    let in_sample_residuals: Vec<f64> = (&y - fitted).iter().copied().collect();

    let model_shell = TrainedModel {
        currency: series.currency().clone(),
        window_start: series.start_ts().expect("non-empty series"),
        window_end: series.end_ts().expect("non-empty series"),
        fitted_at,
        intercept,
        lag_coefficients,
        seasonal_coefficient,
        seasonality_period: config.seasonality_period,
        state: Vec::new(),
        in_sample_residuals,
        validation: Vec::new(),
    };

    // Walk-forward validation over the held-out tail: each prediction uses
    // actual history only, never earlier predictions.
    let validation: Vec<ValidationPair> = (split..n)
        .map(|t| ValidationPair {
            actual: values[t],
            predicted: model_shell.predict_next(&values[..t]),
        })
        .collect();

    Ok(TrainedModel {
        state: values[n - max_lag..].to_vec(),
        validation,
        ..model_shell
    })
}

fn design_row(values: &[f64], t: usize, lag_depth: usize, seasonal: Option<usize>) -> Vec<f64> {
    let mut row = Vec::with_capacity(1 + lag_depth + usize::from(seasonal.is_some()));
    row.push(1.0);
    for lag in 1..=lag_depth {
        row.push(values[t - lag]);
    }
    if let Some(period) = seasonal {
        row.push(values[t - period]);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecast_core::RatePoint;

    fn series_from(values: &[f64]) -> RateSeries {
        let start = UtcDateTime::parse_date("2025-01-01").expect("date");
        let points: Vec<RatePoint> = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                RatePoint::new(start.plus_days(index as i64), *value).expect("point")
            })
            .collect();
        let as_of = start.plus_days(values.len() as i64);
        RateSeries::new(CurrencyCode::parse("EUR").expect("code"), points, as_of)
            .expect("series")
    }

    fn ar1_values(phi: f64, len: usize) -> Vec<f64> {
        let mut values = vec![4.0];
        for index in 1..len {
            let noise = ((index * 7_919) % 1_000) as f64 / 5_000.0 - 0.1;
            values.push(2.0 + phi * values[index - 1] + noise);
        }
        values
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let series = series_from(&ar1_values(0.6, 300));
        let config = TrainerConfig {
            lag_depth: 1,
            ..TrainerConfig::default()
        };

        let model = train(&series, &config, UtcDateTime::parse_date("2026-01-01").expect("date"))
            .expect("model");

        assert!((model.lag_coefficients[0] - 0.6).abs() < 0.2);
        assert!(!model.validation().is_empty());
        assert!(!model.in_sample_residuals().is_empty());
    }

    #[test]
    fn splits_chronologically() {
        let values = ar1_values(0.5, 200);
        let series = series_from(&values);
        let config = TrainerConfig::default();

        let model = train(&series, &config, UtcDateTime::parse_date("2026-01-01").expect("date"))
            .expect("model");

        // Held-out pairs are exactly the tail of the series, in order.
        let tail = &values[160..];
        let actuals: Vec<f64> = model.validation().iter().map(|pair| pair.actual).collect();
        assert_eq!(actuals, tail);
    }

    #[test]
    fn rejects_short_series() {
        let series = series_from(&ar1_values(0.5, 12));
        let err = train(
            &series,
            &TrainerConfig::default(),
            UtcDateTime::parse_date("2026-01-01").expect("date"),
        )
        .expect_err("must fail");

        assert!(matches!(err, TrainError::WindowTooShort { .. }));
    }

    #[test]
    fn rejects_invalid_split_ratio() {
        let series = series_from(&ar1_values(0.5, 200));
        let config = TrainerConfig {
            split_ratio: 1.0,
            ..TrainerConfig::default()
        };

        let err = train(
            &series,
            &config,
            UtcDateTime::parse_date("2026-01-01").expect("date"),
        )
        .expect_err("must fail");
        assert!(matches!(err, TrainError::InvalidSplitRatio { .. }));
    }

    #[test]
    fn constant_series_diverges() {
        let series = series_from(&vec![4.25; 200]);
        let err = train(
            &series,
            &TrainerConfig::default(),
            UtcDateTime::parse_date("2026-01-01").expect("date"),
        )
        .expect_err("must fail");

        assert!(matches!(err, TrainError::Divergence(_)));
    }

    #[test]
    fn seasonal_lag_extends_the_state_window() {
        let series = series_from(&ar1_values(0.5, 300));
        let config = TrainerConfig {
            lag_depth: 2,
            seasonality_period: 7,
            ..TrainerConfig::default()
        };

        let model = train(&series, &config, UtcDateTime::parse_date("2026-01-01").expect("date"))
            .expect("model");

        assert_eq!(model.max_lag(), 7);
        assert_eq!(model.state.len(), 7);
        assert!(model.seasonal_coefficient.is_some());
    }
}
