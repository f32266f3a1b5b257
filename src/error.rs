// ABOUTME: Error taxonomy for the migration engine
// ABOUTME: Separates fatal pre-flight failures from per-table and per-row failures

use thiserror::Error;

/// Errors surfaced by the migration engine.
///
/// Only `Connection`, `Metadata` and `Config` are fatal. `Transfer` is
/// isolated to one table and `Row` to one row; both are logged and counted
/// by the orchestrator rather than propagated to the process exit status.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Source or sink could not be opened
    #[error("Failed to connect to {side}: {source:#}")]
    Connection {
        side: &'static str,
        source: anyhow::Error,
    },

    /// The source catalog could not be listed
    #[error("Failed to list tables in schema '{schema}': {source:#}")]
    Metadata {
        schema: String,
        source: anyhow::Error,
    },

    /// A whole table could not be read or written
    #[error("Transfer of table '{table}' failed: {source:#}")]
    Transfer {
        table: String,
        source: anyhow::Error,
    },

    /// A single row could not be written
    #[error("Row {row} of table '{table}' was not written: {source:#}")]
    Row {
        table: String,
        row: u64,
        source: anyhow::Error,
    },

    /// Invalid command-line configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl MigrateError {
    pub fn transfer(table: &str, source: anyhow::Error) -> Self {
        Self::Transfer {
            table: table.to_string(),
            source,
        }
    }
}
