use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::PathBuf;

use crate::app_dirs::AppDirs;
use crate::metrics::MetricOutcome;

/// One persisted metric evaluation, as read back from the history database.
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub session: String,
    pub metric: String,
    pub delay_ms: Option<i64>,
    pub deviation_sq: Option<i64>,
    pub compared: i64,
    pub skipped: i64,
    pub error: Option<String>,
    pub recorded_at: DateTime<Local>,
}

/// Database manager for per-session metric history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = Self::get_db_path().unwrap_or_else(|| PathBuf::from("lagscope_history.db"));

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    /// Open against an explicit path (tests and --history-db overrides)
    pub fn with_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    /// In-memory database, used by tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(HistoryDb { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS metric_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session TEXT NOT NULL,
                metric TEXT NOT NULL,
                delay_ms INTEGER,
                deviation_sq INTEGER,
                compared INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                error TEXT,
                recorded_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_metric_history_metric ON metric_history(metric)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_metric_history_session ON metric_history(session)",
            [],
        )?;

        Ok(())
    }

    /// Get the database file path under $HOME/.local/state/lagscope
    fn get_db_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    /// Record one metric outcome for a session
    pub fn record_outcome(&self, session: &str, outcome: &MetricOutcome) -> Result<()> {
        let (delay_ms, deviation_sq, compared, skipped, error) = match &outcome.result {
            Ok(r) => (
                r.delay_ms,
                r.deviation_sq,
                r.compared as i64,
                r.skipped as i64,
                None,
            ),
            Err(e) => (None, None, 0, 0, Some(e.to_string())),
        };

        self.conn.execute(
            r#"
            INSERT INTO metric_history
            (session, metric, delay_ms, deviation_sq, compared, skipped, error, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                session,
                outcome.name,
                delay_ms,
                deviation_sq,
                compared,
                skipped,
                error,
                Local::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Record a whole session's outcomes in one transaction
    pub fn record_session(&mut self, session: &str, outcomes: &[MetricOutcome]) -> Result<()> {
        let tx = self.conn.transaction()?;

        for outcome in outcomes {
            let (delay_ms, deviation_sq, compared, skipped, error) = match &outcome.result {
                Ok(r) => (
                    r.delay_ms,
                    r.deviation_sq,
                    r.compared as i64,
                    r.skipped as i64,
                    None,
                ),
                Err(e) => (None, None, 0, 0, Some(e.to_string())),
            };

            tx.execute(
                r#"
                INSERT INTO metric_history
                (session, metric, delay_ms, deviation_sq, compared, skipped, error, recorded_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    session,
                    outcome.name,
                    delay_ms,
                    deviation_sq,
                    compared,
                    skipped,
                    error,
                    Local::now().to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get every recorded row for one metric, newest first
    pub fn get_metric_rows(&self, metric: &str) -> Result<Vec<HistoryRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session, metric, delay_ms, deviation_sq, compared, skipped, error, recorded_at
            FROM metric_history
            WHERE metric = ?1
            ORDER BY recorded_at DESC
            "#,
        )?;

        let row_iter = stmt.query_map([metric], |row| {
            let recorded_at_str: String = row.get(7)?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        7,
                        "recorded_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(HistoryRow {
                session: row.get(0)?,
                metric: row.get(1)?,
                delay_ms: row.get(2)?,
                deviation_sq: row.get(3)?,
                compared: row.get(4)?,
                skipped: row.get(5)?,
                error: row.get(6)?,
                recorded_at,
            })
        })?;

        let mut rows = Vec::new();
        for row in row_iter {
            rows.push(row?);
        }

        Ok(rows)
    }

    /// Average resolved delay for a metric across all recorded sessions
    pub fn get_avg_delay(&self, metric: &str) -> Result<Option<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT AVG(delay_ms) FROM metric_history WHERE metric = ?1 AND delay_ms IS NOT NULL",
        )?;

        let avg: Option<f64> = stmt.query_row([metric], |row| row.get(0))?;
        Ok(avg)
    }

    /// Share of skipped snapshots for a metric, as a percentage of all
    /// windowed snapshots ever scored for it
    pub fn get_skip_ratio(&self, metric: &str) -> Result<f64> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                SUM(compared + skipped) as total,
                SUM(skipped) as skipped
            FROM metric_history
            WHERE metric = ?1
            "#,
        )?;

        let (total, skipped): (Option<i64>, Option<i64>) =
            stmt.query_row([metric], |row| Ok((row.get(0)?, row.get(1)?)))?;

        match (total, skipped) {
            (Some(total), Some(skipped)) if total > 0 => {
                Ok((skipped as f64 / total as f64) * 100.0)
            }
            _ => Ok(0.0),
        }
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM metric_history", [])?;
        Ok(())
    }

    /// Get the actual database file path being used (for debugging)
    pub fn get_database_path() -> Option<PathBuf> {
        Self::get_db_path()
    }
}
