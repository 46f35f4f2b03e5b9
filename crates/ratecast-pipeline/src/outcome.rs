use std::fmt::{Display, Formatter};

use serde::Serialize;

use ratecast_core::CurrencyCode;
use ratecast_model::{ForecastPoint, RiskScore};

/// Why a currency dropped out of part of a run's output.
///
/// All of these are per-currency and recoverable at the run level: the
/// orchestrator records the reason and keeps processing the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    InsufficientHistory,
    DataGap,
    TrainingDivergence,
    UndefinedRisk,
    ForecastUnavailable,
}

impl ExclusionReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::DataGap => "data_gap",
            Self::TrainingDivergence => "training_divergence",
            Self::UndefinedRisk => "undefined_risk",
            Self::ForecastUnavailable => "forecast_unavailable",
        }
    }
}

impl Display for ExclusionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Terminal state of one currency's pipeline within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyStatus {
    /// Trained, scored, and forecast; eligible for ranking.
    Ranked,
    /// Forecast produced but risk is undefined; reported, never ranked.
    Unscored,
    /// Dropped from this run's outputs entirely.
    Excluded(ExclusionReason),
}

impl CurrencyStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ranked => "ranked",
            Self::Unscored => "unscored",
            Self::Excluded(_) => "excluded",
        }
    }
}

/// Everything one per-currency pipeline produced, success or not.
#[derive(Debug, Clone)]
pub struct CurrencyOutcome {
    pub currency: CurrencyCode,
    pub status: CurrencyStatus,
    pub risk: Option<RiskScore>,
    pub forecasts: Vec<ForecastPoint>,
    /// Reason code or diagnostic carried into the output status column.
    pub detail: Option<String>,
    pub warnings: Vec<String>,
}

impl CurrencyOutcome {
    pub fn excluded(
        currency: CurrencyCode,
        reason: ExclusionReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            currency,
            status: CurrencyStatus::Excluded(reason),
            risk: None,
            forecasts: Vec::new(),
            detail: Some(detail.into()),
            warnings: Vec::new(),
        }
    }
}
