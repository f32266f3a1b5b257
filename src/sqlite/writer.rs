// ABOUTME: SQLite statement execution for migrated rows
// ABOUTME: Parameter binding for coerced values, column discovery and batched inserts

use crate::sink::SinkColumn;
use crate::utils::quote_sqlite_ident;
use crate::value::CoercedValue;
use anyhow::{anyhow, Context, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

impl ToSql for CoercedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            CoercedValue::Null => ValueRef::Null,
            CoercedValue::Integer(i) => ValueRef::Integer(*i),
            CoercedValue::Float(f) => ValueRef::Real(*f),
            CoercedValue::Text(s) => ValueRef::Text(s.as_bytes()),
            CoercedValue::Bytes(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

/// List the columns of a SQLite table
///
/// Returns an empty vector when the table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<SinkColumn>> {
    let query = format!("PRAGMA table_info({})", quote_sqlite_ident(table));

    let mut stmt = conn
        .prepare(&query)
        .with_context(|| format!("Failed to prepare column query for table '{}'", table))?;

    let columns = stmt
        .query_map([], |row| {
            Ok(SinkColumn {
                name: row.get(1)?,
                declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })
        .with_context(|| format!("Failed to query columns of table '{}'", table))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read columns of table '{}'", table))?;

    Ok(columns)
}

/// Execute one statement with bound parameters
///
/// Statements are prepared through the connection's statement cache, so the
/// per-table insert is compiled once and reused for every row.
pub fn execute(conn: &Connection, sql: &str, params: &[CoercedValue]) -> Result<()> {
    let mut stmt = conn.prepare_cached(sql).context("Failed to prepare statement")?;
    stmt.execute(params_from_iter(params.iter()))
        .context("Failed to execute statement")?;
    Ok(())
}

/// Execute one statement per parameter set inside a single transaction
///
/// A failed row does not roll back the others. SQLite normally keeps the
/// transaction open after a statement-level error, so the batch commits with
/// every row that succeeded. A conflict resolved with `ROLLBACK` (or an I/O
/// error) ends the transaction instead; the offending row is recorded as
/// failed and the rest of the batch is replayed in a fresh transaction.
pub fn execute_batch(
    conn: &mut Connection,
    sql: &str,
    rows: &[Vec<CoercedValue>],
) -> Result<Vec<Result<()>>> {
    let mut outcomes: Vec<Option<Result<()>>> = rows.iter().map(|_| None).collect();
    let mut pending: Vec<usize> = (0..rows.len()).collect();

    while !pending.is_empty() {
        let tx = conn
            .transaction()
            .context("Failed to begin batch transaction")?;

        let mut written = Vec::with_capacity(pending.len());
        let mut aborted_by = None;
        {
            let mut stmt = tx
                .prepare_cached(sql)
                .context("Failed to prepare batch statement")?;

            for &index in &pending {
                match stmt.execute(params_from_iter(rows[index].iter())) {
                    Ok(_) => written.push(index),
                    Err(e) => {
                        outcomes[index] =
                            Some(Err(anyhow::Error::new(e).context("Failed to execute statement")));
                        if tx.is_autocommit() {
                            aborted_by = Some(index);
                            break;
                        }
                    }
                }
            }
        }

        match aborted_by {
            None => {
                tx.commit().context("Failed to commit batch transaction")?;
                for index in written {
                    outcomes[index] = Some(Ok(()));
                }
                pending.clear();
            }
            Some(failed) => {
                // The transaction is already gone; dropping it is a no-op
                drop(tx);
                tracing::debug!(
                    "Batch transaction rolled back by row {} of {}, replaying the remaining rows",
                    failed + 1,
                    rows.len()
                );
                pending.retain(|&index| outcomes[index].is_none());
            }
        }
    }

    Ok(outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(|| Err(anyhow!("Row was not executed"))))
        .collect())
}
