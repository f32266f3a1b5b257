// ABOUTME: Migration orchestrator fanning out one transfer task per table
// ABOUTME: Enumerates tables, bounds concurrency, joins tasks and summarises outcomes

use crate::config::InsertMode;
use crate::error::MigrateError;
use crate::filters::ExclusionSet;
use crate::progress::Progress;
use crate::sink::Sink;
use crate::source::Source;
use crate::transfer::{TableReport, TableTransfer};
use futures::future::join_all;
use indicatif::HumanDuration;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// List the tables to migrate
///
/// Any catalog failure is a `MigrateError::Metadata`; nothing can be copied
/// without a table list.
pub async fn list_tables(
    source: &dyn Source,
    exclude: &ExclusionSet,
) -> Result<Vec<String>, MigrateError> {
    let tables = source
        .list_tables()
        .await
        .map_err(|e| MigrateError::Metadata {
            schema: source.schema().to_string(),
            source: e,
        })?;

    let total = tables.len();
    let tables = exclude.apply(tables);
    if tables.len() < total {
        tracing::info!(
            "Excluded {} table(s), {} left to migrate",
            total - tables.len(),
            tables.len()
        );
    }

    Ok(tables)
}

/// Lifecycle of one table transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Completed(TableReport),
    Failed(String),
}

/// One table's unit of work, owned by its task until terminal
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub table: String,
    pub state: TaskState,
}

impl TransferTask {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            state: TaskState::Pending,
        }
    }

    fn start(&mut self) {
        tracing::debug!("Starting transfer of table '{}'", self.table);
        self.state = TaskState::Running;
    }

    fn finish(&mut self, result: Result<TableReport, MigrateError>) {
        self.state = match result {
            Ok(report) => TaskState::Completed(report),
            Err(e) => {
                tracing::error!("{}", e);
                TaskState::Failed(e.to_string())
            }
        };
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TaskState::Completed(_) | TaskState::Failed(_))
    }
}

/// Result of a whole migration run
#[derive(Debug, Clone)]
pub struct MigrationSummary {
    pub tasks: Vec<TransferTask>,
    pub elapsed: Duration,
}

impl MigrationSummary {
    pub fn reports(&self) -> impl Iterator<Item = &TableReport> {
        self.tasks.iter().filter_map(|task| match &task.state {
            TaskState::Completed(report) => Some(report),
            _ => None,
        })
    }

    pub fn tables_completed(&self) -> usize {
        self.reports().count()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|task| matches!(task.state, TaskState::Failed(_)))
            .map(|task| task.table.as_str())
            .collect()
    }

    pub fn rows_written(&self) -> u64 {
        self.reports().map(|r| r.rows_written).sum()
    }

    pub fn rows_failed(&self) -> u64 {
        self.reports().map(|r| r.rows_failed).sum()
    }

    /// Whether any table failed or any row was skipped
    pub fn has_failures(&self) -> bool {
        !self.failed_tables().is_empty() || self.rows_failed() > 0
    }

    pub fn log(&self) {
        for report in self.reports().filter(|r| r.rows_failed > 0) {
            tracing::warn!(
                "Table '{}': {} row(s) skipped",
                report.table,
                report.rows_failed
            );
        }
        for table in self.failed_tables() {
            tracing::error!("Table '{}' was not migrated", table);
        }

        tracing::info!(
            "Migration finished in {}: {} of {} table(s) copied, {} row(s) written, {} row(s) skipped",
            HumanDuration(self.elapsed),
            self.tables_completed(),
            self.tasks.len(),
            self.rows_written(),
            self.rows_failed()
        );
    }
}

/// Runs a full migration across every selected table
pub struct Migrator {
    source: Arc<dyn Source>,
    progress: Arc<dyn Progress>,
    transfer: Arc<TableTransfer>,
    workers: usize,
}

impl Migrator {
    /// # Arguments
    ///
    /// * `workers` - Maximum transfers running at once; `0` runs every
    ///   table at the same time
    pub fn new(
        source: Arc<dyn Source>,
        sink: Arc<dyn Sink>,
        progress: Arc<dyn Progress>,
        workers: usize,
        insert_mode: InsertMode,
    ) -> Self {
        let transfer = Arc::new(TableTransfer::new(
            Arc::clone(&source),
            sink,
            Arc::clone(&progress),
            insert_mode,
        ));

        Self {
            source,
            progress,
            transfer,
            workers,
        }
    }

    /// Migrate every table not in `exclude`
    ///
    /// Fails only if the table list cannot be read. Per-table failures are
    /// logged and recorded in the summary; they never stop sibling tables.
    pub async fn run(&self, exclude: &ExclusionSet) -> Result<MigrationSummary, MigrateError> {
        let started = Instant::now();
        let tables = list_tables(self.source.as_ref(), exclude).await?;

        let tables_counter = self.progress.tables(tables.len() as u64);
        let semaphore = match self.workers {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        tracing::info!(
            "Migrating {} table(s) with {} worker(s)",
            tables.len(),
            if self.workers == 0 {
                "unbounded".to_string()
            } else {
                self.workers.to_string()
            }
        );

        let mut names = Vec::with_capacity(tables.len());
        let mut handles = Vec::with_capacity(tables.len());

        for table in tables {
            let mut task = TransferTask::new(table.clone());
            let transfer = Arc::clone(&self.transfer);
            let counter = Arc::clone(&tables_counter);
            let semaphore = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };

                task.start();
                let result = transfer.transfer(&task.table).await;
                counter.increment();
                task.finish(result);
                task
            }));
            names.push(table);
        }

        let mut tasks = Vec::with_capacity(handles.len());
        for (table, joined) in names.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    tracing::error!("Transfer task for table '{}' aborted: {}", table, e);
                    tables_counter.increment();
                    tasks.push(TransferTask {
                        table,
                        state: TaskState::Failed(format!("transfer task aborted: {}", e)),
                    });
                }
            }
        }
        tables_counter.finish();

        Ok(MigrationSummary {
            tasks,
            elapsed: started.elapsed(),
        })
    }
}
