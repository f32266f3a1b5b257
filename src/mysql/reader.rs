// ABOUTME: MySQL database introspection and streaming data reads
// ABOUTME: Lists base tables, counts rows and streams table contents row by row

use crate::mysql::converter::mysql_row_to_raw;
use crate::source::{Cursor, Row};
use crate::utils::quote_mysql_ident;
use anyhow::{anyhow, Context, Result};
use mysql_async::{prelude::*, Conn, Pool};
use tokio::sync::{mpsc, oneshot};

/// List all base tables in a MySQL database
///
/// Queries INFORMATION_SCHEMA; views are not included.
///
/// # Arguments
///
/// * `conn` - MySQL connection
/// * `db_name` - Database name to list tables from
///
/// # Examples
///
/// ```no_run
/// # use mysql_sqlite_migrator::mysql::reader::list_tables;
/// # async fn example(pool: mysql_async::Pool) -> anyhow::Result<()> {
/// let mut conn = pool.get_conn().await?;
/// let tables = list_tables(&mut conn, "mydb").await?;
/// println!("Found {} tables", tables.len());
/// # Ok(())
/// # }
/// ```
pub async fn list_tables(conn: &mut Conn, db_name: &str) -> Result<Vec<String>> {
    tracing::info!("Listing tables from MySQL database '{}'", db_name);

    let query = r#"
        SELECT TABLE_NAME
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    "#;

    let tables: Vec<String> = conn
        .exec(query, (db_name,))
        .await
        .with_context(|| format!("Failed to list tables from database '{}'", db_name))?;

    tracing::info!("Found {} table(s) in database '{}'", tables.len(), db_name);

    Ok(tables)
}

/// Get row count for a MySQL table
///
/// Only used to size progress bars, so a count that is stale by the time
/// the rows are read does no harm.
pub async fn get_table_row_count(conn: &mut Conn, db_name: &str, table_name: &str) -> Result<u64> {
    tracing::debug!("Getting row count for table '{}.{}'", db_name, table_name);

    let query = format!(
        "SELECT COUNT(*) FROM {}.{}",
        quote_mysql_ident(db_name),
        quote_mysql_ident(table_name)
    );

    let count: Option<u64> = conn
        .query_first(query)
        .await
        .with_context(|| format!("Failed to count rows in table '{}'", table_name))?;

    let count = count.unwrap_or(0);

    tracing::debug!("Table '{}' has {} rows", table_name, count);

    Ok(count)
}

/// Open a streaming cursor over every row of a table
///
/// A connection is checked out of the pool and handed to a background task
/// that runs `SELECT * FROM <table>` over the binary protocol (so numbers
/// arrive typed rather than as strings) and feeds converted rows into a
/// channel of capacity one. The cursor is returned once the result set's
/// column metadata is known.
///
/// Dropping the cursor stops the reader; the remaining result set is
/// drained before the connection goes back to the pool.
///
/// # Errors
///
/// Returns error if no connection is available or the query cannot be
/// started. Errors later in the scan arrive as an `Err` row.
pub async fn open_table_cursor(pool: &Pool, db_name: &str, table_name: &str) -> Result<Cursor> {
    let query = format!(
        "SELECT * FROM {}.{}",
        quote_mysql_ident(db_name),
        quote_mysql_ident(table_name)
    );

    let mut conn = pool
        .get_conn()
        .await
        .with_context(|| format!("Failed to get connection to read table '{}'", table_name))?;

    let (columns_tx, columns_rx) = oneshot::channel::<Result<Vec<String>>>();
    let (rows_tx, rows_rx) = mpsc::channel::<Result<Row>>(1);
    let table = table_name.to_string();

    tokio::spawn(async move {
        let mut result = match conn.exec_iter(query, ()).await {
            Ok(result) => result,
            Err(e) => {
                let err = anyhow::Error::new(e)
                    .context(format!("Failed to read data from table '{}'", table));
                let _ = columns_tx.send(Err(err));
                return;
            }
        };

        let columns: Vec<String> = result
            .columns_ref()
            .iter()
            .map(|col| col.name_str().into_owned())
            .collect();
        let width = columns.len();

        tracing::debug!(
            "Table '{}' has {} columns: {:?}",
            table,
            width,
            columns
        );

        if columns_tx.send(Ok(columns)).is_err() {
            return;
        }

        loop {
            match result.next().await {
                Ok(Some(row)) => {
                    if rows_tx.send(Ok(mysql_row_to_raw(row, width))).await.is_err() {
                        tracing::debug!("Reader for table '{}' stopped early", table);
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let err = anyhow::Error::new(e)
                        .context(format!("Failed to read row from table '{}'", table));
                    let _ = rows_tx.send(Err(err)).await;
                    break;
                }
            }
        }

        if let Err(e) = result.drop_result().await {
            tracing::debug!("Failed to drain result set for table '{}': {}", table, e);
        }
    });

    let columns = columns_rx
        .await
        .map_err(|_| anyhow!("Reader task for table '{}' ended unexpectedly", table_name))??;

    Ok(Cursor::new(columns, rows_rx))
}
