//! Error-handling behavior: per-currency failures become status rows,
//! run-fatal failures publish nothing.

use ratecast_core::{CurrencyCode, UtcDateTime};
use ratecast_model::ForecastPoint;
use ratecast_pipeline::{
    build_output_tables, CurrencyOutcome, CurrencyStatus, ExclusionReason, Orchestrator,
    OrchestratorError, PipelineConfig,
};
use ratecast_tests::{config_for, open_temp_warehouse, seed_fixture_history};

const AS_OF: &str = "2026-06-30";

#[tokio::test]
async fn long_gap_excludes_the_currency_with_data_gap() {
    // Given: 200 days of EUR history with a 10-day hole, beyond the default
    // forward-fill limit of 3.
    let (_temp, warehouse) = open_temp_warehouse();
    seed_fixture_history(&warehouse, &["EUR", "USD"], 200, AS_OF).await;
    warehouse
        .execute_query(
            "DELETE FROM rates WHERE currency = 'EUR'
             AND CAST(ts AS DATE) BETWEEN DATE '2026-05-01' AND DATE '2026-05-10'",
            ratecast_warehouse::QueryGuardrails::default(),
            true,
        )
        .expect("punch gap");

    let orchestrator =
        Orchestrator::new(warehouse, config_for(&["EUR", "USD"])).expect("orchestrator");
    let report = orchestrator
        .run(UtcDateTime::parse_date(AS_OF).expect("date"))
        .await
        .expect("run");

    // Then: EUR is excluded with a gap diagnostic, USD still ranks.
    let eur = report
        .recommendations
        .iter()
        .find(|row| row.currency == "EUR")
        .expect("EUR row");
    assert_eq!(eur.status, "excluded");
    assert!(eur.detail.as_deref().expect("detail").contains("data gap"));
    assert!(report.forecasts.iter().all(|row| row.currency != "EUR"));

    assert_eq!(report.counts.ranked, 1);
    assert_eq!(report.counts.excluded, 1);
}

#[tokio::test]
async fn totally_empty_feed_history_aborts_the_run_without_publishing() {
    let (_temp, warehouse) = open_temp_warehouse();

    let orchestrator =
        Orchestrator::new(warehouse.clone(), config_for(&["EUR"])).expect("orchestrator");
    let error = orchestrator
        .run(UtcDateTime::parse_date(AS_OF).expect("date"))
        .await
        .expect_err("must fail");

    assert!(matches!(error, OrchestratorError::FeedUnavailable(_)));
    assert!(!warehouse.run_completed(AS_OF).expect("check"));
    assert!(warehouse.load_recommendations(AS_OF).expect("load").is_empty());
}

#[tokio::test]
async fn invalid_configuration_is_run_fatal_before_any_work() {
    let (_temp, warehouse) = open_temp_warehouse();
    let config = PipelineConfig {
        parallelism: 0,
        ..config_for(&["EUR"])
    };

    let error = Orchestrator::new(warehouse, config).expect_err("must fail");
    assert!(matches!(error, OrchestratorError::InvalidConfig(_)));
}

#[test]
fn undefined_risk_reports_the_forecast_but_never_ranks_it() {
    // A currency whose held-out actuals were all zero ends up Unscored: the
    // forecast table still carries its points, the recommendation table
    // reports it without a rank.
    let as_of = UtcDateTime::parse_date(AS_OF).expect("date");
    let currency = CurrencyCode::parse("EUR").expect("currency");
    let outcome = CurrencyOutcome {
        currency: currency.clone(),
        status: CurrencyStatus::Unscored,
        risk: None,
        forecasts: vec![ForecastPoint {
            currency,
            target_ts: as_of.plus_days(1),
            predicted_rate: 4.31,
            generated_at: as_of,
        }],
        detail: Some(String::from(ExclusionReason::UndefinedRisk.code())),
        warnings: Vec::new(),
    };

    let tables = build_output_tables(&[outcome], AS_OF, as_of);

    assert_eq!(tables.forecasts.len(), 1);
    assert_eq!(tables.forecasts[0].currency, "EUR");

    assert_eq!(tables.recommendations.len(), 1);
    let row = &tables.recommendations[0];
    assert_eq!(row.status, "unscored");
    assert_eq!(row.rank, None);
    assert_eq!(row.risk_indicator, None);
    assert_eq!(row.detail.as_deref(), Some("undefined_risk"));

    assert_eq!(tables.counts.ranked, 0);
    assert_eq!(tables.counts.unscored, 1);
}

#[test]
fn excluded_outcomes_carry_their_reason_code_rows_only() {
    let as_of = UtcDateTime::parse_date(AS_OF).expect("date");
    let outcome = CurrencyOutcome::excluded(
        CurrencyCode::parse("GBP").expect("currency"),
        ExclusionReason::TrainingDivergence,
        "training diverged: normal equations are singular",
    );

    let tables = build_output_tables(&[outcome], AS_OF, as_of);

    assert!(tables.forecasts.is_empty());
    assert_eq!(tables.recommendations.len(), 1);
    assert_eq!(tables.recommendations[0].status, "excluded");
    assert!(tables.recommendations[0]
        .detail
        .as_deref()
        .expect("detail")
        .contains("diverged"));
}
