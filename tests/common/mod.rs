// ABOUTME: Shared fixtures for integration tests
// ABOUTME: In-memory source, recording progress and SQLite target helpers

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mysql_sqlite_migrator::progress::{Counter, Progress};
use mysql_sqlite_migrator::source::{Cursor, Row, Source};
use mysql_sqlite_migrator::sqlite::SqliteSink;
use mysql_sqlite_migrator::value::RawValue;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A table served by `StaticSource`
#[derive(Clone, Default)]
pub struct StaticTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Fail the scan after this many rows
    pub fail_after: Option<usize>,
    pub fail_open: bool,
    pub fail_count: bool,
}

impl StaticTable {
    pub fn new(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            ..Self::default()
        }
    }
}

/// In-memory `Source` with scripted failures
#[derive(Default)]
pub struct StaticSource {
    pub order: Vec<String>,
    pub tables: HashMap<String, StaticTable>,
    pub fail_catalog: bool,
    pub opened: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: StaticTable) -> Self {
        self.order.push(name.to_string());
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for StaticSource {
    fn schema(&self) -> &str {
        "static"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        if self.fail_catalog {
            return Err(anyhow!("SELECT command denied to user"));
        }
        Ok(self.order.clone())
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        let t = self
            .tables
            .get(table)
            .ok_or_else(|| anyhow!("no table {}", table))?;
        if t.fail_count {
            return Err(anyhow!("count failed"));
        }
        Ok(t.rows.len() as u64)
    }

    async fn open_cursor(&self, table: &str) -> Result<Cursor> {
        let t = self
            .tables
            .get(table)
            .ok_or_else(|| anyhow!("no table {}", table))?;
        if t.fail_open {
            return Err(anyhow!("Table '{}' doesn't exist", table));
        }
        self.opened.lock().unwrap().push(table.to_string());

        let n = match t.fail_after {
            Some(n) => n,
            None => return Ok(Cursor::from_rows(t.columns.clone(), t.rows.clone())),
        };

        // Scripted scan failure after the first n rows
        let (tx, rx) = mpsc::channel(n + 1);
        for row in t.rows.iter().take(n) {
            tx.try_send(Ok(row.clone())).unwrap();
        }
        tx.try_send(Err(anyhow!("Lost connection to MySQL server during query")))
            .unwrap();

        Ok(Cursor::new(t.columns.clone(), rx))
    }
}

/// Progress sink that records every tick
#[derive(Default)]
pub struct RecordingProgress {
    pub table_total: AtomicU64,
    pub table_ticks: Arc<AtomicU64>,
    pub row_ticks: Mutex<HashMap<String, Arc<AtomicU64>>>,
}

impl RecordingProgress {
    pub fn table_ticks(&self) -> u64 {
        self.table_ticks.load(Ordering::SeqCst)
    }

    pub fn row_ticks(&self, table: &str) -> u64 {
        self.row_ticks
            .lock()
            .unwrap()
            .get(table)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

struct AtomicTicks(Arc<AtomicU64>);

impl Counter for AtomicTicks {
    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Progress for RecordingProgress {
    fn tables(&self, total: u64) -> Arc<dyn Counter> {
        self.table_total.store(total, Ordering::SeqCst);
        Arc::new(AtomicTicks(Arc::clone(&self.table_ticks)))
    }

    fn rows(&self, table: &str, _total: Option<u64>) -> Arc<dyn Counter> {
        let ticks = Arc::clone(
            self.row_ticks
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default(),
        );
        Arc::new(AtomicTicks(ticks))
    }
}

/// SQLite target file with the given schema, kept alive by the TempDir
pub fn sqlite_target(schema: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(schema).unwrap();
    (dir, path)
}

pub fn open_sink(path: &PathBuf) -> Arc<SqliteSink> {
    Arc::new(SqliteSink::open(path).unwrap())
}

pub fn count_rows(path: &PathBuf, table: &str) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn ids(path: &PathBuf, table: &str) -> HashSet<i64> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(&format!("SELECT id FROM \"{}\"", table))
        .unwrap();
    let ids = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<HashSet<i64>, _>>()
        .unwrap();
    ids
}

pub fn int(i: i64) -> RawValue {
    RawValue::Integer(i)
}

pub fn bytes(s: &str) -> RawValue {
    RawValue::Bytes(s.as_bytes().to_vec())
}
