//! Observability
//!
//! Subscriber setup and a [`PipelineObserver`] that reports pipeline
//! progress as `tracing` events.

use std::error::Error as StdError;

use nimbus::{
    catalog::UpsertSummary,
    observer::PipelineObserver,
    pipeline::{RejectedEntry, RunReport},
    products::Product,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, filter::ParseError};
use uuid::Uuid;

use crate::config::{LogFormat, LoggingConfig};

/// Subscriber setup errors
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The log level is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(#[source] Box<dyn StdError + Send + Sync>),
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` directives win over the configured level.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_missing| EnvFilter::try_new(&config.log_level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(ObservabilityError::Init)
}

/// Logs pipeline progress, tagging every event with the run id.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    run_id: Uuid,
}

impl TracingObserver {
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id }
    }

    /// Id attached to every event of the run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl PipelineObserver for TracingObserver {
    fn on_run_start(&self, vendor: &str, regions: usize) {
        info!(run_id = %self.run_id, vendor, regions, "starting ingestion run");
    }

    fn on_region_start(&self, region: &str) {
        debug!(run_id = %self.run_id, region, "canonicalizing region");
    }

    fn on_product(&self, product: &Product) {
        debug!(
            run_id = %self.run_id,
            region = product.region(),
            sku = product.sku(),
            product_hash = %product.product_hash(),
            "product canonicalized"
        );
    }

    fn on_entry_rejected(&self, rejected: &RejectedEntry) {
        warn!(
            run_id = %self.run_id,
            region = %rejected.region,
            category = %rejected.category,
            name = rejected.name.as_deref(),
            error = %rejected.error,
            "skipping catalog entry"
        );
    }

    fn on_batch_committed(&self, region: Option<&str>, summary: &UpsertSummary) {
        info!(
            run_id = %self.run_id,
            region,
            products_inserted = summary.products_inserted,
            products_matched = summary.products_matched,
            prices_inserted = summary.prices_inserted,
            prices_unchanged = summary.prices_unchanged,
            "batch committed"
        );
    }

    fn on_run_complete(&self, report: &RunReport) {
        info!(
            run_id = %self.run_id,
            vendor = %report.vendor,
            regions = report.regions,
            products = report.products,
            rejected = report.rejected.len(),
            rows_written = report.summary.rows_written(),
            "ingestion run complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use nimbus::{catalog::InMemoryCatalog, pipeline::Pipeline, sources::BuiltinSource};
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn observer_runs_without_subscriber() -> TestResult {
        let run_id = Uuid::now_v7();
        let observer = TracingObserver::new(run_id);

        let report = Pipeline::new(InMemoryCatalog::new())
            .with_observer(observer)
            .run_at(&BuiltinSource::Scaleway, Timestamp::UNIX_EPOCH)
            .await?;

        assert_eq!(observer.run_id(), run_id);
        assert_eq!(report.products, 12);

        Ok(())
    }
}
