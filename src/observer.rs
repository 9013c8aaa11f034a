//! Pipeline Observer

use crate::{
    catalog::UpsertSummary,
    pipeline::{RejectedEntry, RunReport},
    products::Product,
};

/// Callbacks fired as a pipeline run progresses.
///
/// The pipeline itself never logs. Observers turn these callbacks into log
/// lines, metrics or test assertions. Every method except
/// [`PipelineObserver::on_entry_rejected`] has an empty default.
pub trait PipelineObserver: Send + Sync {
    /// Called once the vendor catalog has been loaded.
    fn on_run_start(&self, _vendor: &str, _regions: usize) {}

    /// Called before a region's entries are canonicalized.
    fn on_region_start(&self, _region: &str) {}

    /// Called for every product that made it into a batch.
    fn on_product(&self, _product: &Product) {}

    /// Called for every entry skipped because of bad data.
    fn on_entry_rejected(&self, rejected: &RejectedEntry);

    /// Called after the sink accepted a batch. `region` is `None` for a
    /// run-wide batch.
    fn on_batch_committed(&self, _region: Option<&str>, _summary: &UpsertSummary) {}

    /// Called when the run finished without a fatal error.
    fn on_run_complete(&self, _report: &RunReport) {}
}

impl<O: PipelineObserver + ?Sized> PipelineObserver for &O {
    fn on_run_start(&self, vendor: &str, regions: usize) {
        (**self).on_run_start(vendor, regions);
    }

    fn on_region_start(&self, region: &str) {
        (**self).on_region_start(region);
    }

    fn on_product(&self, product: &Product) {
        (**self).on_product(product);
    }

    fn on_entry_rejected(&self, rejected: &RejectedEntry) {
        (**self).on_entry_rejected(rejected);
    }

    fn on_batch_committed(&self, region: Option<&str>, summary: &UpsertSummary) {
        (**self).on_batch_committed(region, summary);
    }

    fn on_run_complete(&self, report: &RunReport) {
        (**self).on_run_complete(report);
    }
}

/// Observer that ignores everything; rejected entries still land in the
/// [`RunReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_entry_rejected(&self, _: &RejectedEntry) {}
}
