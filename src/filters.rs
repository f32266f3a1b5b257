// ABOUTME: Table exclusion filtering for the migration
// ABOUTME: Parses the comma-separated skip list and applies it to catalog results

use std::collections::HashSet;

/// Set of table names that must not be migrated
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    tables: HashSet<String>,
}

impl ExclusionSet {
    /// Parse a comma-separated list of table names
    ///
    /// Entries are whitespace-trimmed and empty entries are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mysql_sqlite_migrator::filters::ExclusionSet;
    /// let skip = ExclusionSet::parse(" sessions, ,cache_entries ");
    /// assert!(skip.contains("sessions"));
    /// assert!(skip.contains("cache_entries"));
    /// assert!(!skip.contains(""));
    /// assert_eq!(skip.len(), 2);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let tables = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Self { tables }
    }

    /// Creates an empty set (migrate everything)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Determines if a table should be migrated
    pub fn should_migrate_table(&self, table: &str) -> bool {
        !self.contains(table)
    }

    /// Drop excluded tables, keeping catalog order for the rest
    pub fn apply(&self, tables: Vec<String>) -> Vec<String> {
        if self.is_empty() {
            return tables;
        }

        tables
            .into_iter()
            .filter(|table| {
                let keep = self.should_migrate_table(table);
                if !keep {
                    tracing::debug!("Skipping excluded table '{}'", table);
                }
                keep
            })
            .collect()
    }
}
