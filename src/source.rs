// ABOUTME: Source database interface used by the transfer engine
// ABOUTME: Catalog listing, row counts and streaming cursors over RawValue rows

use crate::value::RawValue;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One row, aligned with `Cursor::columns`
pub type Row = Vec<RawValue>;

/// Read side of a migration.
///
/// Implementations must allow many cursors to be open at once, one per
/// concurrently running table transfer.
#[async_trait]
pub trait Source: Send + Sync {
    /// Name of the schema being migrated, for log and error messages
    fn schema(&self) -> &str;

    /// List every migratable table in the schema, in catalog order
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Row count used for progress display only
    async fn row_count(&self, table: &str) -> Result<u64>;

    /// Open a streaming cursor over `SELECT * FROM <table>`
    async fn open_cursor(&self, table: &str) -> Result<Cursor>;
}

/// A streaming read over one table.
///
/// Column names are captured once when the cursor opens. Rows arrive over a
/// channel fed by the source; an `Err` item ends the scan.
pub struct Cursor {
    columns: Vec<String>,
    rows: mpsc::Receiver<Result<Row>>,
}

impl Cursor {
    pub fn new(columns: Vec<String>, rows: mpsc::Receiver<Result<Row>>) -> Self {
        Self { columns, rows }
    }

    /// Build a cursor over rows that are already in memory
    ///
    /// # Examples
    ///
    /// ```
    /// # use mysql_sqlite_migrator::source::Cursor;
    /// # use mysql_sqlite_migrator::value::RawValue;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let mut cursor = Cursor::from_rows(
    ///     vec!["id".to_string()],
    ///     vec![vec![RawValue::Integer(1)], vec![RawValue::Integer(2)]],
    /// );
    /// assert_eq!(cursor.columns(), ["id".to_string()]);
    /// assert!(cursor.next().await.is_some());
    /// assert!(cursor.next().await.is_some());
    /// assert!(cursor.next().await.is_none());
    /// # }
    /// ```
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let (tx, rx) = mpsc::channel(rows.len().max(1));
        for row in rows {
            // Capacity matches the row count, so this cannot fail
            let _ = tx.try_send(Ok(row));
        }
        Self::new(columns, rx)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next row, `None` once the scan is complete
    pub async fn next(&mut self) -> Option<Result<Row>> {
        self.rows.recv().await
    }
}
