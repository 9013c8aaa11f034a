//! Application errors.

use std::io;

use nimbus::pipeline::PipelineError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum AppError {
    /// No built-in table exists for the vendor.
    #[error("no built-in catalog for vendor {0:?}; pass --source to load one from a file")]
    UnknownVendor(String),

    /// Neither `--database-url` nor `--dry-run` was given.
    #[error("a database url is required unless --dry-run is set")]
    MissingDatabaseUrl,

    /// The database could not be reached.
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migrations failed.
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] MigrateError),

    /// The ingestion run failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The report could not be written.
    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),
}
