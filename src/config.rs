// ABOUTME: Migration configuration assembled from command-line flags
// ABOUTME: Validates connection parameters and engine settings before any connection opens

use crate::error::MigrateError;
use mysql_async::OptsBuilder;
use std::path::PathBuf;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_WORKERS: usize = 8;

/// MySQL connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl SourceConfig {
    /// Build source settings from a `host[:port]` address
    pub fn new(address: &str, user: &str, password: &str, database: &str) -> Result<Self, MigrateError> {
        let (host, port) = parse_address(address)?;

        if database.trim().is_empty() {
            return Err(MigrateError::Config(
                "MySQL database name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        })
    }

    /// Connection options for `mysql_async`
    ///
    /// Every session starts with an empty `sql_mode` so zero dates and other
    /// legacy values read back instead of erroring.
    pub fn opts(&self) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
            .init(vec!["SET sql_mode=''"])
    }

    /// Address without credentials, for logs
    pub fn display_address(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// How rows are staged before being written to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// One statement execution per row, each committed on its own
    PerRow,
    /// Rows staged per table and written in transactions of this many rows
    Batched(usize),
}

impl InsertMode {
    /// `0` selects per-row inserts, anything else batches of that size
    pub fn from_batch_size(batch_size: usize) -> Self {
        match batch_size {
            0 => InsertMode::PerRow,
            n => InsertMode::Batched(n),
        }
    }
}

/// Complete settings for one migration run
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub target_path: PathBuf,
    /// Comma-separated table names to skip
    pub skip: String,
    /// Maximum concurrently running table transfers; `0` means unbounded
    pub workers: usize,
    pub insert_mode: InsertMode,
    pub row_progress: bool,
    pub show_progress: bool,
    pub fail_on_error: bool,
}

impl MigrationConfig {
    pub fn new(source: SourceConfig, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            target_path: target_path.into(),
            skip: String::new(),
            workers: DEFAULT_WORKERS,
            insert_mode: InsertMode::PerRow,
            row_progress: false,
            show_progress: true,
            fail_on_error: false,
        }
    }

    /// Check the target path before anything is opened
    pub fn validate(&self) -> Result<(), MigrateError> {
        validate_target_path(&self.target_path)
    }
}

/// Split `host[:port]` into its parts
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::config::parse_address;
/// assert_eq!(parse_address("db.internal:3307").unwrap(), ("db.internal".to_string(), 3307));
/// assert_eq!(parse_address("localhost").unwrap(), ("localhost".to_string(), 3306));
/// assert!(parse_address("localhost:port").is_err());
/// ```
pub fn parse_address(address: &str) -> Result<(String, u16), MigrateError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(MigrateError::Config(
            "MySQL host cannot be empty".to_string(),
        ));
    }

    // Bracketed IPv6 literal, with or without a port
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            MigrateError::Config(format!("Unterminated IPv6 address '{}'", address))
        })?;
        let port = match tail.strip_prefix(':') {
            Some(port) => parse_port(port, address)?,
            None if tail.is_empty() => DEFAULT_MYSQL_PORT,
            None => {
                return Err(MigrateError::Config(format!(
                    "Invalid MySQL host '{}'",
                    address
                )))
            }
        };
        return Ok((host.to_string(), port));
    }

    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            if host.is_empty() {
                return Err(MigrateError::Config(format!(
                    "Missing host name in '{}'",
                    address
                )));
            }
            Ok((host.to_string(), parse_port(port, address)?))
        }
        // Bare IPv6 literal without brackets
        Some(_) => Ok((address.to_string(), DEFAULT_MYSQL_PORT)),
        None => Ok((address.to_string(), DEFAULT_MYSQL_PORT)),
    }
}

fn parse_port(port: &str, address: &str) -> Result<u16, MigrateError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(MigrateError::Config(format!(
            "Invalid port '{}' in MySQL host '{}'",
            port, address
        ))),
        Ok(port) => Ok(port),
    }
}

/// Validate the SQLite target path
///
/// The file itself may be missing (SQLite creates it), but then no target
/// tables exist and every table transfer will fail; that case is only
/// warned about. A directory or a missing parent directory is an error.
pub fn validate_target_path(path: &std::path::Path) -> Result<(), MigrateError> {
    if path.as_os_str().is_empty() {
        return Err(MigrateError::Config(
            "SQLite file path cannot be empty".to_string(),
        ));
    }

    if path.is_dir() {
        return Err(MigrateError::Config(format!(
            "SQLite path '{}' is a directory",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(MigrateError::Config(format!(
                "Directory '{}' for the SQLite file does not exist",
                parent.display()
            )));
        }
    }

    if !path.exists() {
        tracing::warn!(
            "SQLite file '{}' does not exist; it will be created without any tables",
            path.display()
        );
    }

    Ok(())
}
