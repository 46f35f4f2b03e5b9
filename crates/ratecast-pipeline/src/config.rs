use serde::{Deserialize, Serialize};
use thiserror::Error;

use ratecast_core::{CurrencyCode, StoreConfig};
use ratecast_model::TrainerConfig;

/// Pipeline configuration.
///
/// Every field has a default so a partial configuration file only needs to
/// name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Currencies the pipeline runs for.
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,

    /// Minimum observed history before a currency may train.
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// Chronological train/validation split ratio.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,

    /// Forecast horizon in daily periods.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Maximum consecutive missing days the forward-fill policy covers.
    #[serde(default = "default_gap_fill_limit")]
    pub gap_fill_limit: usize,

    /// Autoregressive lag depth.
    #[serde(default = "default_lag_depth")]
    pub lag_depth: usize,

    /// Seasonal lag; 0 disables the seasonal regressor.
    #[serde(default)]
    pub seasonality_period: usize,

    /// Maximum concurrently running per-currency pipelines.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Run-level timeout; on expiry nothing is published.
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
            min_history: default_min_history(),
            split_ratio: default_split_ratio(),
            horizon: default_horizon(),
            gap_fill_limit: default_gap_fill_limit(),
            lag_depth: default_lag_depth(),
            seasonality_period: 0,
            parallelism: default_parallelism(),
            run_timeout_ms: default_run_timeout_ms(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("currencies must not be empty")]
    NoCurrencies,

    #[error("invalid currency in configuration: '{value}'")]
    InvalidCurrency { value: String },

    #[error("split_ratio must be within (0, 1), got {value}")]
    InvalidSplitRatio { value: f64 },

    #[error("{field} must be greater than zero")]
    ZeroField { field: &'static str },

    #[error("min_history ({min_history}) must exceed the deepest configured lag ({max_lag})")]
    HistoryBelowLags { min_history: usize, max_lag: usize },
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.currency_codes()?;

        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigError::InvalidSplitRatio {
                value: self.split_ratio,
            });
        }

        for (field, value) in [
            ("min_history", self.min_history),
            ("horizon", self.horizon),
            ("lag_depth", self.lag_depth),
            ("parallelism", self.parallelism),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroField { field });
            }
        }
        if self.run_timeout_ms == 0 {
            return Err(ConfigError::ZeroField {
                field: "run_timeout_ms",
            });
        }

        let max_lag = self.lag_depth.max(self.seasonality_period);
        if self.min_history <= max_lag {
            return Err(ConfigError::HistoryBelowLags {
                min_history: self.min_history,
                max_lag,
            });
        }

        Ok(())
    }

    pub fn currency_codes(&self) -> Result<Vec<CurrencyCode>, ConfigError> {
        if self.currencies.is_empty() {
            return Err(ConfigError::NoCurrencies);
        }

        self.currencies
            .iter()
            .map(|value| {
                CurrencyCode::parse(value).map_err(|_| ConfigError::InvalidCurrency {
                    value: value.clone(),
                })
            })
            .collect()
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            min_history: self.min_history,
            gap_fill_limit: self.gap_fill_limit,
        }
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            lag_depth: self.lag_depth,
            seasonality_period: self.seasonality_period,
            split_ratio: self.split_ratio,
        }
    }
}

fn default_currencies() -> Vec<String> {
    ["EUR", "USD", "GBP", "JPY", "CHF"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_min_history() -> usize {
    100
}

fn default_split_ratio() -> f64 {
    0.8
}

fn default_horizon() -> usize {
    7
}

fn default_gap_fill_limit() -> usize {
    3
}

fn default_lag_depth() -> usize {
    5
}

fn default_parallelism() -> usize {
    4
}

fn default_run_timeout_ms() -> u64 {
    60_000
}
