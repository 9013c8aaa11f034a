//! Command line configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nimbus::pipeline::Batching;

mod observability;

pub use observability::{LogFormat, LoggingConfig};

/// Nimbus catalog CLI
#[derive(Debug, Parser)]
#[command(name = "nimbus-app", about = "Nimbus pricing catalog CLI", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Load configuration from `.env`, the environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a vendor catalog into the store.
    Scrape(ScrapeArgs),

    /// Apply catalog schema migrations.
    Migrate(DatabaseConfig),
}

/// `PostgreSQL` settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Options of the `scrape` command.
#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// YAML catalog file; the built-in table of `--vendor` is used when omitted
    #[arg(long, env = "NIMBUS_SOURCE")]
    pub source: Option<PathBuf>,

    /// Vendor whose built-in table to ingest
    #[arg(long, default_value = "scaleway")]
    pub vendor: String,

    /// When products are written to the store
    #[arg(long, value_enum, default_value_t = BatchingMode::PerRegion)]
    pub batching: BatchingMode,

    /// Ingest into memory and print the products instead of writing to the database
    #[arg(long)]
    pub dry_run: bool,

    /// `PostgreSQL` connection string
    #[arg(
        long,
        env = "DATABASE_URL",
        hide_env_values = true,
        required_unless_present = "dry_run"
    )]
    pub database_url: Option<String>,
}

/// Batching granularity as spelled on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BatchingMode {
    /// One upsert per region
    #[default]
    PerRegion,

    /// One upsert for the whole run
    Global,
}

impl From<BatchingMode> for Batching {
    fn from(mode: BatchingMode) -> Self {
        match mode {
            BatchingMode::PerRegion => Batching::PerRegion,
            BatchingMode::Global => Batching::Global,
        }
    }
}
