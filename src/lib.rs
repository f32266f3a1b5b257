// ABOUTME: Library module for mysql-sqlite-migrator
// ABOUTME: Exports the transfer engine, its collaborators and the MySQL/SQLite backends

pub mod coerce;
pub mod config;
pub mod error;
pub mod filters;
pub mod migrate;
pub mod mysql;
pub mod progress;
pub mod sink;
pub mod source;
pub mod sqlite;
pub mod transfer;
pub mod utils;
pub mod value;

pub use error::MigrateError;
pub use migrate::{MigrationSummary, Migrator};
