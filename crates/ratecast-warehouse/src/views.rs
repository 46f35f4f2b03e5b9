use ::duckdb::Connection;

/// Views exposing the most recent completed run to dashboards and the CLI.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE OR REPLACE VIEW latest_forecasts AS
SELECT f.*
FROM forecasts f
WHERE f.run_date = (SELECT MAX(run_date) FROM run_log WHERE status = 'completed');

CREATE OR REPLACE VIEW latest_recommendations AS
SELECT r.*
FROM recommendations r
WHERE r.run_date = (SELECT MAX(run_date) FROM run_log WHERE status = 'completed')
ORDER BY r."rank" NULLS LAST, r.currency;
"#,
    )
}
