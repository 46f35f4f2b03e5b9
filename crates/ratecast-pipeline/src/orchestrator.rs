use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use ratecast_core::{
    build_series, CurrencyCode, RateRecord, StoreError, UtcDateTime, ValidationError,
};
use ratecast_model::{score, train, ForecastPoint, RiskError, TrainError};
use ratecast_warehouse::{
    ForecastRow, RecommendationRow, RunCounts, Warehouse, WarehouseError,
};

use crate::config::{ConfigError, PipelineConfig};
use crate::outcome::{CurrencyOutcome, CurrencyStatus, ExclusionReason};
use crate::ranker::{rank, summarize, RankCandidate};

/// Run-fatal errors. Per-currency failures never surface here; they become
/// exclusion rows in the published tables instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("upstream feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("run timed out after {timeout_ms}ms; nothing was published")]
    Timeout { timeout_ms: u64 },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("worker task failed: {0}")]
    TaskJoin(String),
}

/// Everything a completed (or replayed) run reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_date: String,
    /// True when the run had already completed and stored tables were served.
    pub cache_hit: bool,
    pub counts: RunCounts,
    pub forecasts: Vec<ForecastRow>,
    pub recommendations: Vec<RecommendationRow>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Sequences the per-currency pipelines for one as-of date.
///
/// The only component with explicit state: it reads the last-successful-run
/// marker, fans out per-currency work, waits for every currency to reach a
/// terminal state, ranks the survivors, and publishes all-or-nothing.
pub struct Orchestrator {
    warehouse: Warehouse,
    config: PipelineConfig,
    currencies: Vec<CurrencyCode>,
}

impl Orchestrator {
    pub fn new(warehouse: Warehouse, config: PipelineConfig) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let currencies = config.currency_codes()?;
        Ok(Self {
            warehouse,
            config,
            currencies,
        })
    }

    /// Run the pipeline for the given as-of date.
    ///
    /// Idempotent: a date that already completed is served from the stored
    /// tables without recomputation. A timed-out run publishes nothing and
    /// leaves the run marker untouched.
    pub async fn run(&self, as_of: UtcDateTime) -> Result<RunReport, OrchestratorError> {
        let started = Instant::now();
        let run_date = as_of.date_string();
        let run_id = Uuid::new_v4().to_string();

        if self.warehouse.run_completed(&run_date)? {
            let forecasts = self.warehouse.load_forecasts(&run_date)?;
            let recommendations = self.warehouse.load_recommendations(&run_date)?;
            let counts = counts_from_rows(&recommendations);

            return Ok(RunReport {
                run_id,
                run_date: run_date.clone(),
                cache_hit: true,
                counts,
                forecasts,
                recommendations,
                warnings: vec![format!(
                    "run for {run_date} already completed; serving stored tables"
                )],
                latency_ms: elapsed_ms(started),
            });
        }

        if self.warehouse.count_rates()? == 0 {
            return Err(OrchestratorError::FeedUnavailable(String::from(
                "rates table is empty; ingest history with `ratecast sync` first",
            )));
        }

        let timeout = Duration::from_millis(self.config.run_timeout_ms);
        let outcomes = tokio::time::timeout(timeout, self.run_currencies(as_of))
            .await
            .map_err(|_| OrchestratorError::Timeout {
                timeout_ms: self.config.run_timeout_ms,
            })??;

        let tables = build_output_tables(&outcomes, &run_date, as_of);

        self.warehouse.publish_run(
            &run_id,
            &run_date,
            &tables.forecasts,
            &tables.recommendations,
            tables.counts,
            elapsed_ms(started),
        )?;

        // Report what the tables now say, so a replayed run is byte-identical.
        let forecasts = self.warehouse.load_forecasts(&run_date)?;
        let recommendations = self.warehouse.load_recommendations(&run_date)?;

        Ok(RunReport {
            run_id,
            run_date,
            cache_hit: false,
            counts: tables.counts,
            forecasts,
            recommendations,
            warnings: tables.warnings,
            latency_ms: elapsed_ms(started),
        })
    }

    /// Fan the per-currency pipelines out as tasks bounded by the configured
    /// parallelism, then wait for all of them. Dropping the join set (run
    /// timeout) aborts whatever is still in flight; partial results are
    /// discarded, never published.
    async fn run_currencies(
        &self,
        as_of: UtcDateTime,
    ) -> Result<Vec<CurrencyOutcome>, OrchestratorError> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let mut tasks = JoinSet::new();

        for currency in &self.currencies {
            let rows = self
                .warehouse
                .load_rates(currency.as_str(), &as_of.date_string())?;

            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                records.push(RateRecord {
                    currency: currency.clone(),
                    ts: UtcDateTime::parse_date(&row.date)?,
                    rate: row.rate,
                });
            }

            let currency = currency.clone();
            let config = self.config.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                run_currency(currency, &records, &config, as_of)
            });
        }

        let mut outcomes = Vec::with_capacity(self.currencies.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|error| OrchestratorError::TaskJoin(error.to_string()))?);
        }

        // Arrival order depends on the schedule; the output tables must not.
        outcomes.sort_by(|left, right| left.currency.cmp(&right.currency));
        Ok(outcomes)
    }
}

/// One currency's full pipeline: build the series, train, score, forecast.
/// Pure with respect to its inputs; no shared state with other currencies.
fn run_currency(
    currency: CurrencyCode,
    records: &[RateRecord],
    config: &PipelineConfig,
    as_of: UtcDateTime,
) -> CurrencyOutcome {
    let series = match build_series(&currency, records, as_of, config.store_config()) {
        Ok(series) => series,
        Err(error @ StoreError::InsufficientHistory { .. }) => {
            return CurrencyOutcome::excluded(
                currency,
                ExclusionReason::InsufficientHistory,
                error.to_string(),
            );
        }
        Err(error) => {
            return CurrencyOutcome::excluded(currency, ExclusionReason::DataGap, error.to_string());
        }
    };

    let mut warnings = Vec::new();
    if series.filled_gaps() > 0 {
        warnings.push(format!(
            "forward-filled {} missing day(s) for {currency}",
            series.filled_gaps()
        ));
    }

    let model = match train(&series, &config.trainer_config(), as_of) {
        Ok(model) => model,
        Err(error @ (TrainError::WindowTooShort { .. } | TrainError::EmptyValidationWindow)) => {
            return CurrencyOutcome::excluded(
                currency,
                ExclusionReason::InsufficientHistory,
                error.to_string(),
            );
        }
        Err(error) => {
            return CurrencyOutcome::excluded(
                currency,
                ExclusionReason::TrainingDivergence,
                error.to_string(),
            );
        }
    };

    let forecasts: Vec<ForecastPoint> = match model.forecast(config.horizon) {
        Ok(iterator) => iterator.collect(),
        Err(error) => {
            return CurrencyOutcome::excluded(
                currency,
                ExclusionReason::ForecastUnavailable,
                error.to_string(),
            );
        }
    };

    match score(model.validation()) {
        Ok(risk) => {
            if risk.skipped_zero_actuals > 0 {
                warnings.push(format!(
                    "{} held-out point(s) with zero actuals excluded from RMAPE for {currency}",
                    risk.skipped_zero_actuals
                ));
            }
            CurrencyOutcome {
                currency,
                status: CurrencyStatus::Ranked,
                risk: Some(risk),
                forecasts,
                detail: None,
                warnings,
            }
        }
        Err(RiskError::Undefined) => CurrencyOutcome {
            currency,
            status: CurrencyStatus::Unscored,
            risk: None,
            forecasts,
            detail: Some(String::from(ExclusionReason::UndefinedRisk.code())),
            warnings,
        },
    }
}

/// The two logical output tables of a run plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct RunTables {
    pub forecasts: Vec<ForecastRow>,
    pub recommendations: Vec<RecommendationRow>,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
}

/// Turn terminal per-currency outcomes into the run's output tables.
///
/// Pure: given the same outcomes, the tables are byte-identical. Forecast
/// rows are emitted for ranked and unscored currencies; excluded currencies
/// appear only as status rows.
pub fn build_output_tables(
    outcomes: &[CurrencyOutcome],
    run_date: &str,
    as_of: UtcDateTime,
) -> RunTables {
    let generated_at = as_of.format_rfc3339();
    let mut forecasts = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        warnings.extend(outcome.warnings.iter().cloned());
        for point in &outcome.forecasts {
            forecasts.push(ForecastRow {
                currency: point.currency.to_string(),
                run_date: run_date.to_owned(),
                target_date: point.target_ts.date_string(),
                predicted_rate: point.predicted_rate,
                generated_at: generated_at.clone(),
            });
        }
    }

    let candidates: Vec<RankCandidate> = outcomes
        .iter()
        .filter(|outcome| outcome.status == CurrencyStatus::Ranked)
        .filter_map(|outcome| {
            let risk = outcome.risk?;
            let summary = summarize(&outcome.forecasts)?;
            Some(RankCandidate {
                currency: outcome.currency.clone(),
                risk: risk.indicator,
                summary,
            })
        })
        .collect();
    let ranked = rank(candidates);

    let mut recommendations = Vec::new();
    for entry in &ranked {
        recommendations.push(RecommendationRow {
            currency: entry.currency.to_string(),
            run_date: run_date.to_owned(),
            risk_indicator: Some(entry.risk.value()),
            rank: Some(entry.rank as i64),
            status: String::from(CurrencyStatus::Ranked.as_str()),
            detail: None,
        });
    }
    for outcome in outcomes {
        if outcome.status == CurrencyStatus::Ranked {
            continue;
        }
        recommendations.push(RecommendationRow {
            currency: outcome.currency.to_string(),
            run_date: run_date.to_owned(),
            risk_indicator: None,
            rank: None,
            status: String::from(outcome.status.as_str()),
            detail: outcome.detail.clone(),
        });
    }

    let counts = RunCounts {
        ranked: ranked.len(),
        unscored: outcomes
            .iter()
            .filter(|outcome| outcome.status == CurrencyStatus::Unscored)
            .count(),
        excluded: outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, CurrencyStatus::Excluded(_)))
            .count(),
    };

    RunTables {
        forecasts,
        recommendations,
        counts,
        warnings,
    }
}

fn counts_from_rows(recommendations: &[RecommendationRow]) -> RunCounts {
    RunCounts {
        ranked: recommendations.iter().filter(|row| row.status == "ranked").count(),
        unscored: recommendations.iter().filter(|row| row.status == "unscored").count(),
        excluded: recommendations.iter().filter(|row| row.status == "excluded").count(),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
