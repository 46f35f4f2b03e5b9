//! Per-currency model lifecycle for ratecast: fit, validate, score, forecast.
//!
//! Each run trains a fresh seasonal autoregressive model per currency,
//! converts its held-out error into a risk indicator, and projects the
//! configured forecast horizon. Models are values, superseded on the next
//! run, never mutated in place.

pub mod forecast;
pub mod risk;
pub mod trainer;

pub use forecast::{ForecastError, ForecastIter, ForecastPoint};
pub use risk::{score, RiskError, RiskIndicator, RiskScore};
pub use trainer::{train, TrainError, TrainedModel, TrainerConfig, ValidationPair};
