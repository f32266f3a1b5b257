// ABOUTME: Progress reporting for tables and rows during migration
// ABOUTME: Counter traits plus indicatif-backed and no-op implementations

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;

/// A counter that tasks tick as they make progress.
///
/// Implementations must tolerate concurrent `increment` calls from any
/// number of tasks without losing updates.
pub trait Counter: Send + Sync {
    fn increment(&self);

    /// Called once when the counted work is over
    fn finish(&self) {}
}

/// Factory for progress counters.
///
/// The orchestrator creates one table counter for the whole run; each
/// transfer asks for its own row counter.
pub trait Progress: Send + Sync {
    /// Overall counter of tables attempted
    fn tables(&self, total: u64) -> Arc<dyn Counter>;

    /// Per-table counter of rows attempted; `total` may be an estimate
    fn rows(&self, table: &str, total: Option<u64>) -> Arc<dyn Counter>;
}

/// Progress sink that discards every tick
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

struct NoCounter;

impl Counter for NoCounter {
    fn increment(&self) {}
}

impl Progress for NoProgress {
    fn tables(&self, _total: u64) -> Arc<dyn Counter> {
        Arc::new(NoCounter)
    }

    fn rows(&self, _table: &str, _total: Option<u64>) -> Arc<dyn Counter> {
        Arc::new(NoCounter)
    }
}

/// Counter backed by an indicatif bar (position updates are atomic)
pub struct BarCounter {
    bar: ProgressBar,
    clear_on_finish: bool,
}

impl BarCounter {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            clear_on_finish: false,
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Counter for BarCounter {
    fn increment(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        if self.clear_on_finish {
            self.bar.finish_and_clear();
        } else {
            self.bar.finish();
        }
    }
}

/// Terminal progress display: one overall bar plus optional per-table bars
pub struct TerminalProgress {
    multi: MultiProgress,
    row_bars: bool,
}

impl TerminalProgress {
    /// # Arguments
    ///
    /// * `row_bars` - Show a bar per table while its rows are copied
    /// * `visible` - Draw to stderr; when false every bar is hidden
    pub fn new(row_bars: bool, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };

        Self {
            multi: MultiProgress::with_draw_target(target),
            row_bars,
        }
    }

    fn style(template: &str) -> ProgressStyle {
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl Progress for TerminalProgress {
    fn tables(&self, total: u64) -> Arc<dyn Counter> {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(Self::style(
            "{prefix:.cyan} [{bar:40}] {pos}/{len} tables ({elapsed_precise})",
        ));
        bar.set_prefix("⇨ Progress");
        Arc::new(BarCounter::new(bar))
    }

    fn rows(&self, table: &str, total: Option<u64>) -> Arc<dyn Counter> {
        if !self.row_bars {
            return Arc::new(NoCounter);
        }

        let bar = match total {
            Some(total) => {
                let bar = self.multi.add(ProgressBar::new(total));
                bar.set_style(Self::style("  {prefix:20!} [{bar:30}] {pos}/{len} rows"));
                bar
            }
            None => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::style("  {prefix:20!} {spinner} {pos} rows"));
                bar
            }
        };
        bar.set_prefix(table.to_string());

        Arc::new(BarCounter {
            bar,
            clear_on_finish: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_counter_counts_increments() {
        let counter = BarCounter::new(ProgressBar::hidden());
        for _ in 0..5 {
            counter.increment();
        }
        assert_eq!(counter.position(), 5);
        counter.finish();
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        const TASKS: u64 = 64;
        const PER_TASK: u64 = 250;

        for _ in 0..5 {
            let counter = Arc::new(BarCounter::new(ProgressBar::hidden()));
            let handles: Vec<_> = (0..TASKS)
                .map(|_| {
                    let counter = Arc::clone(&counter);
                    std::thread::spawn(move || {
                        for _ in 0..PER_TASK {
                            counter.increment();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(counter.position(), TASKS * PER_TASK);
        }
    }

    #[test]
    fn test_hidden_terminal_progress_hands_out_counters() {
        let progress = TerminalProgress::new(true, false);
        let tables = progress.tables(3);
        tables.increment();
        tables.finish();

        let rows = progress.rows("users", Some(10));
        rows.increment();
        rows.finish();

        let unknown = progress.rows("events", None);
        unknown.increment();
        unknown.finish();
    }

    #[test]
    fn test_no_progress_is_silent() {
        let progress = NoProgress;
        progress.tables(1).increment();
        progress.rows("t", Some(1)).increment();
    }
}
