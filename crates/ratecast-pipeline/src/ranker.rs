use serde::Serialize;

use ratecast_core::CurrencyCode;
use ratecast_model::{ForecastPoint, RiskIndicator};

/// Compact description of a forecast sequence carried on recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub horizon: usize,
    pub first: f64,
    pub last: f64,
    pub mean: f64,
}

pub fn summarize(points: &[ForecastPoint]) -> Option<ForecastSummary> {
    let first = points.first()?;
    let last = points.last()?;
    let mean = points.iter().map(|point| point.predicted_rate).sum::<f64>() / points.len() as f64;

    Some(ForecastSummary {
        horizon: points.len(),
        first: first.predicted_rate,
        last: last.predicted_rate,
        mean,
    })
}

/// Input tuple for the ranker: a currency that completed training, scoring,
/// and forecasting this run.
#[derive(Debug, Clone)]
pub struct RankCandidate {
    pub currency: CurrencyCode,
    pub risk: RiskIndicator,
    pub summary: ForecastSummary,
}

/// A ranking entry. Recomputed fully each run.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub currency: CurrencyCode,
    pub risk: RiskIndicator,
    pub rank: usize,
    pub summary: ForecastSummary,
}

/// Order candidates into the run's recommendation list.
///
/// Total order: risk ascending (lower relative error ranks better), ties
/// broken by currency code ascending. The ordering is byte-identical across
/// runs given identical inputs; nothing here depends on arrival order.
pub fn rank(mut candidates: Vec<RankCandidate>) -> Vec<Recommendation> {
    candidates.sort_by(|left, right| {
        left.risk
            .total_cmp(right.risk)
            .then_with(|| left.currency.cmp(&right.currency))
    });

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| Recommendation {
            currency: candidate.currency,
            risk: candidate.risk,
            rank: index + 1,
            summary: candidate.summary,
        })
        .collect()
}
