// ABOUTME: Sink database interface used by the transfer engine
// ABOUTME: Column discovery and parameterised statement execution

use crate::value::{Affinity, CoercedValue};
use anyhow::Result;
use async_trait::async_trait;

/// A column of an existing sink table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkColumn {
    pub name: String,
    pub declared_type: String,
}

impl SinkColumn {
    pub fn affinity(&self) -> Affinity {
        Affinity::from_declared_type(&self.declared_type)
    }
}

/// Write side of a migration.
///
/// Must be safe to call from many transfer tasks at once.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Columns of `table` in the sink; empty when the table does not exist
    async fn table_columns(&self, table: &str) -> Result<Vec<SinkColumn>>;

    /// Execute one statement with bound parameters
    async fn execute(&self, sql: &str, params: Vec<CoercedValue>) -> Result<()>;

    /// Execute one statement once per parameter set inside a single
    /// transaction.
    ///
    /// A failing parameter set does not abort the others; the returned
    /// vector holds one result per input row, in order. The outer `Err` is
    /// reserved for failures of the batch as a whole (begin or commit).
    async fn execute_batch(
        &self,
        sql: &str,
        rows: Vec<Vec<CoercedValue>>,
    ) -> Result<Vec<Result<()>>>;
}
