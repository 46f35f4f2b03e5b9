use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_core_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS rates (
    currency TEXT NOT NULL,
    ts TIMESTAMP NOT NULL,
    rate DOUBLE NOT NULL,
    source TEXT,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY(currency, ts)
);

CREATE TABLE IF NOT EXISTS forecasts (
    currency TEXT NOT NULL,
    run_date DATE NOT NULL,
    target_date DATE NOT NULL,
    predicted_rate DOUBLE NOT NULL,
    generated_at TIMESTAMP NOT NULL,
    PRIMARY KEY(currency, run_date, target_date)
);

CREATE TABLE IF NOT EXISTS recommendations (
    currency TEXT NOT NULL,
    run_date DATE NOT NULL,
    risk_indicator DOUBLE,
    "rank" BIGINT,
    status TEXT NOT NULL,
    detail TEXT,
    PRIMARY KEY(currency, run_date)
);

CREATE TABLE IF NOT EXISTS run_log (
    run_id TEXT NOT NULL,
    run_date DATE NOT NULL,
    status TEXT NOT NULL,
    ranked BIGINT NOT NULL,
    unscored BIGINT NOT NULL,
    excluded BIGINT NOT NULL,
    latency_ms BIGINT,
    completed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS run_marker (
    id INTEGER PRIMARY KEY,
    run_date DATE NOT NULL,
    completed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS ingest_log (
    request_id TEXT NOT NULL,
    currency TEXT,
    source TEXT NOT NULL,
    row_count BIGINT NOT NULL,
    status TEXT NOT NULL,
    latency_ms BIGINT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_rates_currency_ts ON rates(currency, ts);
CREATE INDEX IF NOT EXISTS idx_forecasts_run_date ON forecasts(run_date);
CREATE INDEX IF NOT EXISTS idx_recommendations_run_date ON recommendations(run_date);
CREATE INDEX IF NOT EXISTS idx_run_log_run_date ON run_log(run_date);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let query = format!(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = '{}'",
            escape_sql_string(migration.version)
        );
        let applied_count: i64 = connection.query_row(query.as_str(), [], |row| row.get(0))?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            let insert = format!(
                "INSERT INTO schema_migrations (version) VALUES ('{}')",
                escape_sql_string(migration.version)
            );
            connection.execute_batch(insert.as_str())?;
        }
    }

    Ok(())
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
