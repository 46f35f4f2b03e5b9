//! Determinism and idempotence guarantees of the run operation.

use ratecast_core::UtcDateTime;
use ratecast_pipeline::Orchestrator;
use ratecast_tests::{config_for, open_temp_warehouse, seed_fixture_history};

const AS_OF: &str = "2026-06-30";
const CURRENCIES: [&str; 4] = ["CHF", "EUR", "JPY", "USD"];

#[tokio::test]
async fn identical_inputs_produce_identical_tables_across_warehouses() {
    // Two independent warehouses seeded with the same deterministic history;
    // the concurrency schedule inside each run must not leak into the output.
    let (_temp_a, warehouse_a) = open_temp_warehouse();
    let (_temp_b, warehouse_b) = open_temp_warehouse();
    seed_fixture_history(&warehouse_a, &CURRENCIES, 250, AS_OF).await;
    seed_fixture_history(&warehouse_b, &CURRENCIES, 250, AS_OF).await;

    let as_of = UtcDateTime::parse_date(AS_OF).expect("date");
    let report_a = Orchestrator::new(warehouse_a, config_for(&CURRENCIES))
        .expect("orchestrator")
        .run(as_of)
        .await
        .expect("run a");
    let report_b = Orchestrator::new(warehouse_b, config_for(&CURRENCIES))
        .expect("orchestrator")
        .run(as_of)
        .await
        .expect("run b");

    assert_eq!(report_a.forecasts, report_b.forecasts);
    assert_eq!(report_a.recommendations, report_b.recommendations);
}

#[tokio::test]
async fn parallelism_level_does_not_change_the_output() {
    let (_temp_a, warehouse_a) = open_temp_warehouse();
    let (_temp_b, warehouse_b) = open_temp_warehouse();
    seed_fixture_history(&warehouse_a, &CURRENCIES, 250, AS_OF).await;
    seed_fixture_history(&warehouse_b, &CURRENCIES, 250, AS_OF).await;

    let mut serial = config_for(&CURRENCIES);
    serial.parallelism = 1;
    let mut wide = config_for(&CURRENCIES);
    wide.parallelism = 8;

    let as_of = UtcDateTime::parse_date(AS_OF).expect("date");
    let report_serial = Orchestrator::new(warehouse_a, serial)
        .expect("orchestrator")
        .run(as_of)
        .await
        .expect("serial run");
    let report_wide = Orchestrator::new(warehouse_b, wide)
        .expect("orchestrator")
        .run(as_of)
        .await
        .expect("wide run");

    assert_eq!(report_serial.forecasts, report_wide.forecasts);
    assert_eq!(report_serial.recommendations, report_wide.recommendations);
}

#[tokio::test]
async fn rerunning_a_completed_date_is_a_no_op_with_identical_tables() {
    let (_temp, warehouse) = open_temp_warehouse();
    seed_fixture_history(&warehouse, &CURRENCIES, 250, AS_OF).await;

    let orchestrator =
        Orchestrator::new(warehouse.clone(), config_for(&CURRENCIES)).expect("orchestrator");
    let as_of = UtcDateTime::parse_date(AS_OF).expect("date");

    let first = orchestrator.run(as_of).await.expect("first run");
    let second = orchestrator.run(as_of).await.expect("second run");

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.forecasts, second.forecasts);
    assert_eq!(first.recommendations, second.recommendations);

    // Only one audit row exists for the date.
    let audit = warehouse
        .execute_query(
            "SELECT COUNT(*) FROM run_log WHERE run_date = DATE '2026-06-30'",
            ratecast_warehouse::QueryGuardrails::default(),
            false,
        )
        .expect("audit query");
    assert_eq!(audit.rows[0][0], serde_json::json!(1));
}

#[tokio::test]
async fn marker_tracks_the_newest_completed_run() {
    let (_temp, warehouse) = open_temp_warehouse();
    seed_fixture_history(&warehouse, &["EUR"], 300, "2026-07-02").await;

    let orchestrator =
        Orchestrator::new(warehouse.clone(), config_for(&["EUR"])).expect("orchestrator");

    orchestrator
        .run(UtcDateTime::parse_date("2026-07-01").expect("date"))
        .await
        .expect("first day");
    orchestrator
        .run(UtcDateTime::parse_date("2026-07-02").expect("date"))
        .await
        .expect("second day");

    assert_eq!(
        warehouse.last_successful_run().expect("marker").as_deref(),
        Some("2026-07-02")
    );

    // Backfilling an earlier date never regresses the marker.
    orchestrator
        .run(UtcDateTime::parse_date("2026-06-20").expect("date"))
        .await
        .expect("backfill");
    assert_eq!(
        warehouse.last_successful_run().expect("marker").as_deref(),
        Some("2026-07-02")
    );
}
