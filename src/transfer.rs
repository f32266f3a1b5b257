// ABOUTME: Per-table transfer engine from source cursor to sink inserts
// ABOUTME: Coerces each row, isolates row failures and ticks progress counters

use crate::coerce::coerce_row;
use crate::config::InsertMode;
use crate::error::MigrateError;
use crate::progress::{Counter, Progress};
use crate::sink::{Sink, SinkColumn};
use crate::source::{Row, Source};
use crate::utils::quote_sqlite_ident;
use crate::value::{Affinity, CoercedValue};
use anyhow::anyhow;
use std::sync::Arc;

/// Outcome of one table transfer that read to the end of its cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    /// Row count reported by the source before reading, if it was available
    pub expected_rows: Option<u64>,
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_failed: u64,
}

/// Copies single tables from a source to a sink
pub struct TableTransfer {
    source: Arc<dyn Source>,
    sink: Arc<dyn Sink>,
    progress: Arc<dyn Progress>,
    insert_mode: InsertMode,
}

impl TableTransfer {
    pub fn new(
        source: Arc<dyn Source>,
        sink: Arc<dyn Sink>,
        progress: Arc<dyn Progress>,
        insert_mode: InsertMode,
    ) -> Self {
        Self {
            source,
            sink,
            progress,
            insert_mode,
        }
    }

    /// Copy every row of `table` from the source into the sink
    ///
    /// Row write failures are logged, counted in the report and skipped.
    /// Only failures that make the whole table unusable (missing target
    /// table, cursor open failure, read error mid-scan) return an error.
    /// Rows written before a mid-scan error stay in the sink.
    pub async fn transfer(&self, table: &str) -> Result<TableReport, MigrateError> {
        let expected_rows = match self.source.row_count(table).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("Could not count rows in table '{}': {:#}", table, e);
                None
            }
        };

        let sink_columns = self
            .sink
            .table_columns(table)
            .await
            .map_err(|e| MigrateError::transfer(table, e))?;
        if sink_columns.is_empty() {
            return Err(MigrateError::transfer(
                table,
                anyhow!("table does not exist in the SQLite target"),
            ));
        }

        let mut cursor = self
            .source
            .open_cursor(table)
            .await
            .map_err(|e| MigrateError::transfer(table, e))?;

        let mut report = TableReport {
            table: table.to_string(),
            expected_rows,
            ..TableReport::default()
        };

        if expected_rows == Some(0) {
            tracing::info!("Table '{}' is empty, nothing to copy", table);
            return Ok(report);
        }

        let columns = cursor.columns().to_vec();
        let insert_sql = build_insert_sql(table, &columns);
        let affinities = column_affinities(&columns, &sink_columns);
        let rows_counter = self.progress.rows(table, expected_rows);

        tracing::info!(
            "Copying table '{}' ({} columns, {} rows expected)",
            table,
            columns.len(),
            expected_rows.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let batch_size = match self.insert_mode {
            InsertMode::PerRow => 1,
            InsertMode::Batched(n) => n.max(1),
        };
        let mut staged: Vec<Vec<CoercedValue>> = Vec::with_capacity(batch_size);

        let scan = loop {
            let row: Row = match cursor.next().await {
                Some(Ok(row)) => row,
                Some(Err(e)) => break Err(e),
                None => break Ok(()),
            };
            report.rows_read += 1;
            staged.push(coerce_row(row, &affinities));

            if staged.len() >= batch_size {
                let batch = std::mem::replace(&mut staged, Vec::with_capacity(batch_size));
                self.write(table, &insert_sql, batch, &mut report, rows_counter.as_ref())
                    .await;
            }
        };

        if !staged.is_empty() {
            self.write(table, &insert_sql, staged, &mut report, rows_counter.as_ref())
                .await;
        }
        rows_counter.finish();

        if let Err(e) = scan {
            return Err(MigrateError::transfer(table, e));
        }

        if report.rows_failed > 0 {
            tracing::warn!(
                "Table '{}': {} of {} rows were not written",
                table,
                report.rows_failed,
                report.rows_read
            );
        }
        tracing::info!(
            "Finished table '{}': {} rows written",
            table,
            report.rows_written
        );

        Ok(report)
    }

    /// Write staged rows, recording and logging each row's outcome
    ///
    /// Rows are numbered from 1 in cursor order for log messages.
    async fn write(
        &self,
        table: &str,
        sql: &str,
        batch: Vec<Vec<CoercedValue>>,
        report: &mut TableReport,
        rows_counter: &dyn Counter,
    ) {
        let first_row = report.rows_written + report.rows_failed + 1;
        let len = batch.len();

        let outcomes = match self.insert_mode {
            InsertMode::PerRow => {
                let mut outcomes = Vec::with_capacity(len);
                for params in batch {
                    outcomes.push(self.sink.execute(sql, params).await);
                }
                outcomes
            }
            InsertMode::Batched(_) => match self.sink.execute_batch(sql, batch).await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    let msg = format!("{:#}", e);
                    (0..len).map(|_| Err(anyhow!("{}", msg))).collect()
                }
            },
        };

        for (offset, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(()) => report.rows_written += 1,
                Err(source) => {
                    report.rows_failed += 1;
                    let err = MigrateError::Row {
                        table: table.to_string(),
                        row: first_row + offset as u64,
                        source,
                    };
                    tracing::warn!("{}", err);
                }
            }
            rows_counter.increment();
        }
    }
}

/// Build the parameterised insert for a table
///
/// Only identifiers are interpolated; every value is a `?` placeholder.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::transfer::build_insert_sql;
/// let sql = build_insert_sql("users", &["id".to_string(), "name".to_string()]);
/// assert_eq!(sql, r#"INSERT INTO "users" ("id", "name") VALUES (?, ?)"#);
/// ```
pub fn build_insert_sql(table: &str, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_sqlite_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_sqlite_ident(table),
        column_list,
        placeholders
    )
}

/// Affinity of each source column in the sink, matched by name
///
/// SQLite column names are case-insensitive, so matching is too. Source
/// columns the sink lacks are treated as text; their inserts fail anyway.
pub fn column_affinities(columns: &[String], sink_columns: &[SinkColumn]) -> Vec<Affinity> {
    columns
        .iter()
        .map(|name| {
            sink_columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(SinkColumn::affinity)
                .unwrap_or(Affinity::Text)
        })
        .collect()
}
