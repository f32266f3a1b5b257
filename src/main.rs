// ABOUTME: CLI entry point for mysql-sqlite-migrator
// ABOUTME: Parses flags, opens both databases and runs the migration

use anyhow::bail;
use clap::Parser;
use mysql_sqlite_migrator::config::{InsertMode, MigrationConfig, SourceConfig, DEFAULT_WORKERS};
use mysql_sqlite_migrator::filters::ExclusionSet;
use mysql_sqlite_migrator::progress::TerminalProgress;
use mysql_sqlite_migrator::sqlite::SqliteSink;
use mysql_sqlite_migrator::{mysql, MigrateError, Migrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mysql-sqlite-migrator")]
#[command(about = "Copy every MySQL table into an existing SQLite database", long_about = None)]
struct Cli {
    /// Source (mysql) user
    #[arg(long, default_value = "root")]
    mysql_user: String,
    /// Source (mysql) password
    #[arg(long, default_value = "root")]
    mysql_password: String,
    /// Source (mysql) address as host[:port]
    #[arg(long, default_value = "127.0.0.1:3306")]
    mysql_host: String,
    /// Source (mysql) database to copy
    #[arg(long, default_value = "mysql")]
    mysql_db: String,
    /// Target (sqlite) database file; its tables must already exist
    #[arg(long, default_value = "./database.sqlite")]
    sqlite: PathBuf,
    /// Tables to skip (comma-separated)
    #[arg(long, default_value = "")]
    skip: String,
    /// Tables copied at the same time (0 copies every table at once)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,
    /// Rows written per SQLite transaction (0 writes each row on its own)
    #[arg(long, default_value_t = 0)]
    batch_size: usize,
    /// Show a progress bar per table
    #[arg(long)]
    row_progress: bool,
    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
    /// Exit with an error if any table or row could not be copied
    #[arg(long)]
    fail_on_error: bool,
}

impl Cli {
    fn into_config(self) -> Result<MigrationConfig, MigrateError> {
        let source = SourceConfig::new(
            &self.mysql_host,
            &self.mysql_user,
            &self.mysql_password,
            &self.mysql_db,
        )?;

        let mut config = MigrationConfig::new(source, self.sqlite);
        config.skip = self.skip;
        config.workers = self.workers;
        config.insert_mode = InsertMode::from_batch_size(self.batch_size);
        config.row_progress = self.row_progress;
        config.show_progress = !self.no_progress;
        config.fail_on_error = self.fail_on_error;
        config.validate()?;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;

    let source = mysql::connect_mysql(&config.source)
        .await
        .map(Arc::new)
        .map_err(|e| MigrateError::Connection {
            side: "MySQL source",
            source: e,
        })?;
    match source.server_version().await {
        Ok(version) => tracing::info!("MySQL server version {}", version),
        Err(e) => tracing::debug!("Could not read MySQL server version: {:#}", e),
    }

    let sink = SqliteSink::open(&config.target_path).map_err(|e| MigrateError::Connection {
        side: "SQLite target",
        source: e,
    })?;

    let progress = Arc::new(TerminalProgress::new(
        config.row_progress,
        config.show_progress,
    ));
    let migrator = Migrator::new(
        source.clone(),
        Arc::new(sink),
        progress,
        config.workers,
        config.insert_mode,
    );

    let summary = migrator.run(&ExclusionSet::parse(&config.skip)).await;

    if let Err(e) = source.disconnect().await {
        tracing::warn!("{:#}", e);
    }

    let summary = summary?;
    summary.log();

    if config.fail_on_error && summary.has_failures() {
        bail!(
            "{} table(s) failed and {} row(s) were skipped",
            summary.failed_tables().len(),
            summary.rows_failed()
        );
    }

    Ok(())
}
