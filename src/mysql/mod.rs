// ABOUTME: MySQL source for the migration
// ABOUTME: Pooled connections so every table transfer reads on its own session

pub mod converter;
pub mod reader;

use crate::config::SourceConfig;
use crate::source::{Cursor, Source};
use anyhow::{Context, Result};
use async_trait::async_trait;
use mysql_async::{prelude::*, Pool};

/// Connect to MySQL
///
/// Creates a connection pool and verifies connectivity with a ping before
/// any table is touched.
///
/// # Errors
///
/// Returns error if the server cannot be reached or rejects the credentials.
///
/// # Examples
///
/// ```no_run
/// # use mysql_sqlite_migrator::config::SourceConfig;
/// # use mysql_sqlite_migrator::mysql::connect_mysql;
/// # async fn example() -> anyhow::Result<()> {
/// let config = SourceConfig::new("localhost:3306", "root", "root", "shop")?;
/// let source = connect_mysql(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect_mysql(config: &SourceConfig) -> Result<MysqlSource> {
    tracing::info!("Connecting to MySQL database {}", config.display_address());

    let pool = Pool::new(config.opts());

    let mut conn = pool
        .get_conn()
        .await
        .context("Failed to create MySQL connection")?;
    conn.ping().await.context("MySQL server did not answer ping")?;
    drop(conn);

    tracing::debug!("Successfully connected to MySQL");

    Ok(MysqlSource {
        pool,
        database: config.database.clone(),
    })
}

/// MySQL implementation of `Source`
pub struct MysqlSource {
    pool: Pool,
    database: String,
}

impl MysqlSource {
    /// Close every pooled connection
    pub async fn disconnect(&self) -> Result<()> {
        self.pool
            .clone()
            .disconnect()
            .await
            .context("Failed to close MySQL connection pool")
    }

    /// Server version string, for the startup log
    pub async fn server_version(&self) -> Result<String> {
        let mut conn = self.pool.get_conn().await?;
        let version: Option<String> = conn.query_first("SELECT VERSION()").await?;
        Ok(version.unwrap_or_default())
    }
}

#[async_trait]
impl Source for MysqlSource {
    fn schema(&self) -> &str {
        &self.database
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .context("Failed to get connection for catalog query")?;
        reader::list_tables(&mut conn, &self.database).await
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .context("Failed to get connection for row count")?;
        reader::get_table_row_count(&mut conn, &self.database, table).await
    }

    async fn open_cursor(&self, table: &str) -> Result<Cursor> {
        reader::open_table_cursor(&self.pool, &self.database, table).await
    }
}
