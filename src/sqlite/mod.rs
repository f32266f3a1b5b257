// ABOUTME: SQLite sink for the migration
// ABOUTME: One shared connection in WAL mode, driven from blocking tasks

pub mod writer;

use crate::sink::{Sink, SinkColumn};
use crate::value::CoercedValue;
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Open the SQLite target database for writing
///
/// The file is created if it does not exist. The journal is switched to WAL
/// and a busy timeout is set so concurrent table writers wait for the lock
/// instead of failing.
///
/// # Examples
///
/// ```no_run
/// # use mysql_sqlite_migrator::sqlite::open_sqlite;
/// # fn example() -> anyhow::Result<()> {
/// let conn = open_sqlite("database.sqlite".as_ref())?;
/// # Ok(())
/// # }
/// ```
pub fn open_sqlite(path: &Path) -> Result<Connection> {
    tracing::info!("Opening SQLite database: {}", path.display());

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;

    let journal: String = conn
        .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
        .context("Failed to enable WAL journal (database may be corrupted)")?;
    conn.busy_timeout(std::time::Duration::from_secs(30))
        .context("Failed to set SQLite busy timeout")?;
    conn.set_prepared_statement_cache_capacity(256);

    tracing::debug!("Successfully opened SQLite database (journal mode: {})", journal);

    Ok(conn)
}

/// SQLite implementation of `Sink`
///
/// rusqlite connections are not `Sync`, so the connection sits behind a
/// mutex and every call runs on tokio's blocking pool. Writes from all
/// table transfers are serialised through it.
#[derive(Clone)]
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open the target file and wrap it as a sink
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_sqlite(path)?))
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .context("SQLite writer task panicked")?
    }
}

#[async_trait]
impl Sink for SqliteSink {
    async fn table_columns(&self, table: &str) -> Result<Vec<SinkColumn>> {
        let table = table.to_string();
        self.with_conn(move |conn| writer::table_columns(conn, &table))
            .await
    }

    async fn execute(&self, sql: &str, params: Vec<CoercedValue>) -> Result<()> {
        let sql = sql.to_string();
        self.with_conn(move |conn| writer::execute(conn, &sql, &params))
            .await
    }

    async fn execute_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<CoercedValue>>,
    ) -> Result<Vec<Result<()>>> {
        let sql = sql.to_string();
        self.with_conn(move |conn| writer::execute_batch(conn, &sql, &rows))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_sqlite_enables_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.sqlite");

        let conn = open_sqlite(&path).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
    }

    #[test]
    fn test_open_sqlite_invalid_path() {
        let result = open_sqlite(Path::new("/nonexistent/dir/database.sqlite"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sink_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER, body TEXT)", [])
            .unwrap();
        let sink = SqliteSink::new(conn);

        let columns = sink.table_columns("t").await.unwrap();
        assert_eq!(columns.len(), 2);

        sink.execute(
            "INSERT INTO t (id, body) VALUES (?, ?)",
            vec![CoercedValue::Integer(1), CoercedValue::Text("x".to_string())],
        )
        .await
        .unwrap();

        let outcomes = sink
            .execute_batch(
                "INSERT INTO t (id, body) VALUES (?, ?)",
                vec![
                    vec![CoercedValue::Integer(2), CoercedValue::Null],
                    vec![CoercedValue::Integer(3), CoercedValue::Null],
                ],
            )
            .await
            .unwrap();
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let count: i64 = sink
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_sink_statement_error_is_returned() {
        let sink = SqliteSink::new(Connection::open_in_memory().unwrap());
        let result = sink
            .execute("INSERT INTO missing (a) VALUES (?)", vec![CoercedValue::Null])
            .await;
        assert!(result.is_err());
    }
}
