//! DuckDB warehouse for ratecast.
//!
//! Owns the persisted state of the system: ingested rate history, the
//! forecast and recommendation output tables, the run audit log, and the
//! last-successful-run marker. Also exposes the guarded SQL surface used by
//! the `sql` CLI command.

pub mod duckdb;
pub mod migrations;
pub mod views;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ::duckdb::types::Value as DuckValue;
use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

pub use duckdb::{AccessMode, ConnectionPool, PooledConnection};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("query rejected: {0}")]
    QueryRejected(String),

    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub ratecast_home: PathBuf,
    pub db_path: PathBuf,
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let ratecast_home = resolve_ratecast_home();
        let db_path = ratecast_home.join("warehouse.duckdb");
        Self {
            ratecast_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    pub max_rows: usize,
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    fn timeout(self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    fn validate(self) -> Result<(), WarehouseError> {
        if self.max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

/// One ingested rate observation; dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub currency: String,
    pub date: String,
    pub rate: f64,
}

/// One row of the forecast output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub currency: String,
    pub run_date: String,
    pub target_date: String,
    pub predicted_rate: f64,
    pub generated_at: String,
}

/// One row of the recommendation output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub currency: String,
    pub run_date: String,
    pub risk_indicator: Option<f64>,
    pub rank: Option<i64>,
    pub status: String,
    pub detail: Option<String>,
}

/// Counts recorded with a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub ranked: usize,
    pub unscored: usize,
    pub excluded: usize,
}

#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path.clone(), config.max_pool_size);
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Run an ad-hoc SQL query under guardrails. Read-only unless
    /// `allow_write` is set.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = normalize_sql(sql)?;

        if !allow_write {
            enforce_read_only_query(sql)?;
        }

        let mode = if allow_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let connection = self.pool.acquire(mode)?;
        execute_with_guardrails(&connection, sql, guardrails, allow_write)
    }

    /// Insert rate observations transactionally; existing (currency, date)
    /// rows are replaced. Records one ingest_log entry for the batch.
    pub fn ingest_rates(
        &self,
        source: &str,
        request_id: &str,
        rows: &[RateRow],
        latency_ms: u64,
    ) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            for row in rows {
                let sql = format!(
                    r#"
INSERT OR REPLACE INTO rates (currency, ts, rate, source, updated_at)
VALUES ('{currency}', TRY_CAST('{date}' AS TIMESTAMP), {rate}, '{source}', CURRENT_TIMESTAMP);
"#,
                    currency = escape_sql_string(row.currency.as_str()),
                    date = escape_sql_string(row.date.as_str()),
                    rate = row.rate,
                    source = escape_sql_string(source),
                );
                connection.execute_batch(sql.as_str())?;
            }

            let log = format!(
                r#"
INSERT INTO ingest_log (request_id, currency, source, row_count, status, latency_ms, timestamp)
VALUES ('{request_id}', NULL, '{source}', {row_count}, 'ok', {latency_ms}, CURRENT_TIMESTAMP);
"#,
                request_id = escape_sql_string(request_id),
                source = escape_sql_string(source),
                row_count = rows.len(),
                latency_ms = latency_ms,
            );
            connection.execute_batch(log.as_str())?;

            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    /// All observations for one currency up to and including the as-of date,
    /// oldest first.
    pub fn load_rates(&self, currency: &str, as_of: &str) -> Result<Vec<RateRow>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let sql = format!(
            "SELECT currency, CAST(CAST(ts AS DATE) AS VARCHAR), rate
             FROM rates
             WHERE currency = '{currency}' AND CAST(ts AS DATE) <= TRY_CAST('{as_of}' AS DATE)
             ORDER BY ts",
            currency = escape_sql_string(currency),
            as_of = escape_sql_string(as_of),
        );

        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], |row| {
            Ok(RateRow {
                currency: row.get(0)?,
                date: row.get(1)?,
                rate: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
    }

    /// Total observation count across all currencies.
    pub fn count_rates(&self) -> Result<i64, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let count = connection.query_row("SELECT COUNT(*) FROM rates", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Whether a run for the given date already completed successfully.
    pub fn run_completed(&self, run_date: &str) -> Result<bool, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let sql = format!(
            "SELECT COUNT(*) FROM run_log WHERE run_date = TRY_CAST('{}' AS DATE) AND status = 'completed'",
            escape_sql_string(run_date)
        );
        let count: i64 = connection.query_row(sql.as_str(), [], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Run date of the last successful run, if any.
    pub fn last_successful_run(&self) -> Result<Option<String>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection
            .prepare("SELECT CAST(run_date AS VARCHAR) FROM run_marker WHERE id = 1")?;
        let mut rows = statement.query([])?;

        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Publish a completed run atomically: output tables, audit row, and the
    /// run marker all land in one transaction, or none of them do.
    ///
    /// The marker only moves forward; publishing a backfill run for an older
    /// date never regresses it.
    pub fn publish_run(
        &self,
        run_id: &str,
        run_date: &str,
        forecasts: &[ForecastRow],
        recommendations: &[RecommendationRow],
        counts: RunCounts,
        latency_ms: u64,
    ) -> Result<(), WarehouseError> {
        let previous_marker = self.last_successful_run()?;

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let run_date_sql = escape_sql_string(run_date);

            connection.execute_batch(&format!(
                "DELETE FROM forecasts WHERE run_date = TRY_CAST('{run_date_sql}' AS DATE);
                 DELETE FROM recommendations WHERE run_date = TRY_CAST('{run_date_sql}' AS DATE);"
            ))?;

            for row in forecasts {
                let sql = format!(
                    r#"
INSERT INTO forecasts (currency, run_date, target_date, predicted_rate, generated_at)
VALUES ('{currency}', TRY_CAST('{run_date}' AS DATE), TRY_CAST('{target_date}' AS DATE),
        {predicted_rate}, TRY_CAST('{generated_at}' AS TIMESTAMP));
"#,
                    currency = escape_sql_string(row.currency.as_str()),
                    run_date = escape_sql_string(row.run_date.as_str()),
                    target_date = escape_sql_string(row.target_date.as_str()),
                    predicted_rate = row.predicted_rate,
                    generated_at = escape_sql_string(row.generated_at.as_str()),
                );
                connection.execute_batch(sql.as_str())?;
            }

            for row in recommendations {
                let sql = format!(
                    r#"
INSERT INTO recommendations (currency, run_date, risk_indicator, "rank", status, detail)
VALUES ('{currency}', TRY_CAST('{run_date}' AS DATE), {risk}, {rank}, '{status}', {detail});
"#,
                    currency = escape_sql_string(row.currency.as_str()),
                    run_date = escape_sql_string(row.run_date.as_str()),
                    risk = sql_option_f64(row.risk_indicator),
                    rank = sql_option_i64(row.rank),
                    status = escape_sql_string(row.status.as_str()),
                    detail = sql_option_text(row.detail.as_deref()),
                );
                connection.execute_batch(sql.as_str())?;
            }

            connection.execute_batch(&format!(
                r#"
INSERT INTO run_log (run_id, run_date, status, ranked, unscored, excluded, latency_ms, completed_at)
VALUES ('{run_id}', TRY_CAST('{run_date_sql}' AS DATE), 'completed', {ranked}, {unscored}, {excluded}, {latency_ms}, CURRENT_TIMESTAMP);
"#,
                run_id = escape_sql_string(run_id),
                ranked = counts.ranked,
                unscored = counts.unscored,
                excluded = counts.excluded,
                latency_ms = latency_ms,
            ))?;

            let advance = previous_marker
                .as_deref()
                .map_or(true, |marker| run_date > marker);
            if advance {
                connection.execute_batch(&format!(
                    "INSERT OR REPLACE INTO run_marker (id, run_date, completed_at)
                     VALUES (1, TRY_CAST('{run_date_sql}' AS DATE), CURRENT_TIMESTAMP);"
                ))?;
            }

            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    pub fn load_forecasts(&self, run_date: &str) -> Result<Vec<ForecastRow>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let sql = format!(
            "SELECT currency, CAST(run_date AS VARCHAR), CAST(target_date AS VARCHAR),
                    predicted_rate, CAST(generated_at AS VARCHAR)
             FROM forecasts
             WHERE run_date = TRY_CAST('{}' AS DATE)
             ORDER BY currency, target_date",
            escape_sql_string(run_date)
        );

        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], |row| {
            Ok(ForecastRow {
                currency: row.get(0)?,
                run_date: row.get(1)?,
                target_date: row.get(2)?,
                predicted_rate: row.get(3)?,
                generated_at: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
    }

    pub fn load_recommendations(
        &self,
        run_date: &str,
    ) -> Result<Vec<RecommendationRow>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let sql = format!(
            "SELECT currency, CAST(run_date AS VARCHAR), risk_indicator, \"rank\", status, detail
             FROM recommendations
             WHERE run_date = TRY_CAST('{}' AS DATE)
             ORDER BY \"rank\" NULLS LAST, currency",
            escape_sql_string(run_date)
        );

        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], |row| {
            Ok(RecommendationRow {
                currency: row.get(0)?,
                run_date: row.get(1)?,
                risk_indicator: row.get(2)?,
                rank: row.get(3)?,
                status: row.get(4)?,
                detail: row.get(5)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
    }
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn execute_with_guardrails(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    allow_write: bool,
) -> Result<QueryResult, WarehouseError> {
    let started = Instant::now();
    if is_select_like(sql) {
        execute_select_query(connection, sql, guardrails, started)
    } else if allow_write {
        connection.execute_batch(sql)?;
        ensure_timeout(started, guardrails.timeout())?;
        Ok(QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
        })
    } else {
        Err(WarehouseError::QueryRejected(String::from(
            "only SELECT/CTE queries are allowed unless --write is provided",
        )))
    }
}

fn execute_select_query(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    started: Instant,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let _ = statement.query([] as [&dyn ToSql; 0])?;

    // Column metadata is only populated after execution.
    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement.column_name(index).unwrap().to_string();
        let dtype = statement.column_type(index);
        columns.push(SqlColumn {
            name,
            r#type: dtype.to_string(),
        });
    }

    let mut rows_cursor = statement.query([] as [&dyn ToSql; 0])?;
    let mut rows = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows_cursor.next()? {
        ensure_timeout(started, guardrails.timeout())?;

        if rows.len() >= guardrails.max_rows {
            truncated = true;
            break;
        }

        rows.push(read_row(row, column_count)?);
    }

    ensure_timeout(started, guardrails.timeout())?;

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        other => Value::String(format!("{other:?}")),
    }
}

fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "read-only mode accepts only SELECT/CTE queries; use --write for write statements",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed in read-only mode",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

fn has_multiple_statements(sql: &str) -> bool {
    sql.split(';')
        .filter(|part| !part.trim().is_empty())
        .count()
        > 1
}

fn ensure_timeout(started: Instant, timeout: Duration) -> Result<(), WarehouseError> {
    if started.elapsed() > timeout {
        return Err(WarehouseError::QueryTimeout {
            timeout_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
        });
    }
    Ok(())
}

fn resolve_ratecast_home() -> PathBuf {
    if let Some(path) = env::var_os("RATECAST_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".ratecast");
    }

    PathBuf::from(".ratecast")
}

fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

fn sql_option_f64(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => String::from("NULL"),
    }
}

fn sql_option_i64(value: Option<i64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => String::from("NULL"),
    }
}

fn sql_option_text(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("'{}'", escape_sql_string(value)),
        None => String::from("NULL"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp() -> (tempfile::TempDir, Warehouse) {
        let temp = tempdir().expect("tempdir");
        let home = temp.path().join("ratecast-home");
        let warehouse = Warehouse::open(WarehouseConfig {
            db_path: home.join("warehouse.duckdb"),
            ratecast_home: home,
            max_pool_size: 2,
        })
        .expect("warehouse open");
        (temp, warehouse)
    }

    fn rate_row(date: &str, rate: f64) -> RateRow {
        RateRow {
            currency: String::from("EUR"),
            date: date.to_owned(),
            rate,
        }
    }

    #[test]
    fn initializes_tables_and_views() {
        let (_temp, warehouse) = open_temp();

        let query = warehouse
            .execute_query(
                "SELECT COUNT(*) AS c FROM information_schema.tables WHERE table_name = 'recommendations'",
                QueryGuardrails::default(),
                false,
            )
            .expect("query");
        assert_eq!(query.row_count, 1);
    }

    #[test]
    fn read_only_mode_rejects_write_query() {
        let (_temp, warehouse) = open_temp();

        let error = warehouse
            .execute_query(
                "CREATE TABLE test_write (id INTEGER)",
                QueryGuardrails::default(),
                false,
            )
            .expect_err("should reject");

        assert!(matches!(error, WarehouseError::QueryRejected(_)));
    }

    #[test]
    fn ingest_and_load_round_trip() {
        let (_temp, warehouse) = open_temp();
        let rows = vec![
            rate_row("2026-01-01", 4.20),
            rate_row("2026-01-02", 4.25),
            rate_row("2026-01-03", 4.22),
        ];

        let inserted = warehouse
            .ingest_rates("fixture", "request-12345", &rows, 3)
            .expect("ingest");
        assert_eq!(inserted, 3);

        let loaded = warehouse.load_rates("EUR", "2026-01-02").expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, "2026-01-01");
        assert_eq!(loaded[1].date, "2026-01-02");
        assert_eq!(warehouse.count_rates().expect("count"), 3);
    }

    #[test]
    fn ingest_is_idempotent_per_day() {
        let (_temp, warehouse) = open_temp();
        let rows = vec![rate_row("2026-01-01", 4.20)];

        warehouse
            .ingest_rates("fixture", "request-12345", &rows, 1)
            .expect("first ingest");
        warehouse
            .ingest_rates("fixture", "request-67890", &rows, 1)
            .expect("second ingest");

        assert_eq!(warehouse.count_rates().expect("count"), 1);
    }

    #[test]
    fn publish_run_is_atomic_and_marks_completion() {
        let (_temp, warehouse) = open_temp();

        assert!(!warehouse.run_completed("2026-02-01").expect("check"));
        assert_eq!(warehouse.last_successful_run().expect("marker"), None);

        let forecasts = vec![ForecastRow {
            currency: String::from("EUR"),
            run_date: String::from("2026-02-01"),
            target_date: String::from("2026-02-02"),
            predicted_rate: 4.31,
            generated_at: String::from("2026-02-01T00:00:00Z"),
        }];
        let recommendations = vec![RecommendationRow {
            currency: String::from("EUR"),
            run_date: String::from("2026-02-01"),
            risk_indicator: Some(0.012),
            rank: Some(1),
            status: String::from("ranked"),
            detail: None,
        }];

        warehouse
            .publish_run(
                "run-0001-abcd",
                "2026-02-01",
                &forecasts,
                &recommendations,
                RunCounts {
                    ranked: 1,
                    unscored: 0,
                    excluded: 0,
                },
                42,
            )
            .expect("publish");

        assert!(warehouse.run_completed("2026-02-01").expect("check"));
        assert_eq!(
            warehouse.last_successful_run().expect("marker").as_deref(),
            Some("2026-02-01")
        );

        let stored = warehouse.load_recommendations("2026-02-01").expect("load");
        assert_eq!(stored, recommendations);
        let stored_forecasts = warehouse.load_forecasts("2026-02-01").expect("load");
        assert_eq!(stored_forecasts.len(), 1);
        assert_eq!(stored_forecasts[0].target_date, "2026-02-02");
    }

    #[test]
    fn republishing_a_run_replaces_its_rows() {
        let (_temp, warehouse) = open_temp();
        let recommendation = RecommendationRow {
            currency: String::from("EUR"),
            run_date: String::from("2026-02-01"),
            risk_indicator: Some(0.012),
            rank: Some(1),
            status: String::from("ranked"),
            detail: None,
        };
        let counts = RunCounts {
            ranked: 1,
            unscored: 0,
            excluded: 0,
        };

        warehouse
            .publish_run("run-0001-abcd", "2026-02-01", &[], &[recommendation.clone()], counts, 1)
            .expect("first publish");
        warehouse
            .publish_run("run-0002-efgh", "2026-02-01", &[], &[recommendation], counts, 1)
            .expect("second publish");

        let stored = warehouse.load_recommendations("2026-02-01").expect("load");
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn marker_never_regresses_on_backfill() {
        let (_temp, warehouse) = open_temp();
        let counts = RunCounts {
            ranked: 0,
            unscored: 0,
            excluded: 0,
        };

        warehouse
            .publish_run("run-0001-abcd", "2026-02-05", &[], &[], counts, 1)
            .expect("publish newer");
        warehouse
            .publish_run("run-0002-efgh", "2026-02-01", &[], &[], counts, 1)
            .expect("publish backfill");

        assert_eq!(
            warehouse.last_successful_run().expect("marker").as_deref(),
            Some("2026-02-05")
        );
    }
}
