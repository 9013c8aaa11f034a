//! Pipeline
//!
//! Drives one ingestion run: load the vendor catalog, canonicalize and hash
//! every entry region by region, and hand the products to a catalog sink.

use std::collections::hash_map::Entry;

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    canonical::{CanonicalizeError, Canonicalizer, Category},
    catalog::{CatalogSink, SinkError, UpsertSummary},
    hashing::ProductHash,
    observer::{NoopObserver, PipelineObserver},
    products::{Product, ProductIdentity},
    sources::{CatalogEntry, SourceError, VendorSource},
};

/// Fatal run errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The vendor source could not be loaded.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The catalog names an invalid vendor or currency.
    #[error("invalid vendor catalog: {0}")]
    Setup(#[source] CanonicalizeError),

    /// Two different products hashed to the same identity.
    #[error("product hash {hash} is shared by {} and {}", .existing.sku, .incoming.sku)]
    HashCollision {
        /// The shared hash
        hash: ProductHash,
        /// Identity seen first
        existing: Box<ProductIdentity>,
        /// Identity seen second
        incoming: Box<ProductIdentity>,
    },

    /// The sink failed; `committed` holds what earlier batches wrote.
    #[error(
        "catalog upsert failed after {} rows were committed: {source}",
        .committed.rows_written()
    )]
    Sink {
        /// Region of the failed batch, `None` for a run-wide batch
        region: Option<String>,
        /// Totals of the batches that did commit
        committed: UpsertSummary,
        /// Underlying sink error
        #[source]
        source: SinkError,
    },
}

/// Why an entry was skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntryError {
    /// The entry could not be canonicalized.
    #[error(transparent)]
    Canonicalize(#[from] CanonicalizeError),

    /// An earlier entry in the run already produced this product.
    #[error("sku {sku} is listed more than once")]
    DuplicateSku {
        /// The repeated sku
        sku: String,
    },
}

/// An entry skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Region the entry was listed in
    pub region: String,

    /// Category the entry was listed under
    pub category: Category,

    /// Display name, if the entry had one
    pub name: Option<String>,

    /// Why it was skipped
    pub error: EntryError,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Vendor slug
    pub vendor: String,

    /// Effective date stamped on every price of the run
    pub effective_date_start: Timestamp,

    /// Regions walked
    pub regions: usize,

    /// Products handed to the sink
    pub products: usize,

    /// Entries skipped because of bad data
    pub rejected: Vec<RejectedEntry>,

    /// Sink totals across all batches
    pub summary: UpsertSummary,
}

/// When products are handed to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Batching {
    /// One upsert per region
    #[default]
    PerRegion,

    /// One upsert for the whole run
    Global,
}

/// Ingestion pipeline.
#[derive(Debug)]
pub struct Pipeline<S, O = NoopObserver> {
    sink: S,
    observer: O,
    batching: Batching,
}

impl<S: CatalogSink> Pipeline<S> {
    /// Create a pipeline writing to `sink`, batching per region.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            observer: NoopObserver,
            batching: Batching::default(),
        }
    }
}

impl<S: CatalogSink, O: PipelineObserver> Pipeline<S, O> {
    /// Replace the observer.
    pub fn with_observer<P: PipelineObserver>(self, observer: P) -> Pipeline<S, P> {
        Pipeline {
            sink: self.sink,
            observer,
            batching: self.batching,
        }
    }

    /// Change batching granularity.
    #[must_use]
    pub fn with_batching(mut self, batching: Batching) -> Self {
        self.batching = batching;
        self
    }

    /// The sink products are written to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run once, stamping prices with the current time.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_at`].
    pub async fn run<V: VendorSource + ?Sized>(
        &self,
        source: &V,
    ) -> Result<RunReport, PipelineError> {
        self.run_at(source, Timestamp::now()).await
    }

    /// Run once, stamping prices with `effective_date_start`.
    ///
    /// Bad entries are skipped and listed in the report. Nothing is retried.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Source`]: the source could not be loaded.
    /// - [`PipelineError::Setup`]: the catalog's vendor or currency is invalid.
    /// - [`PipelineError::HashCollision`]: two products share an identity hash.
    /// - [`PipelineError::Sink`]: a batch was rejected by the sink.
    pub async fn run_at<V: VendorSource + ?Sized>(
        &self,
        source: &V,
        effective_date_start: Timestamp,
    ) -> Result<RunReport, PipelineError> {
        let catalog = source.load()?;

        let canonicalizer = Canonicalizer::new(&catalog.vendor, &catalog.currency)
            .map_err(PipelineError::Setup)?;

        self.observer
            .on_run_start(canonicalizer.vendor(), catalog.regions.len());

        let mut report = RunReport {
            vendor: catalog.vendor.clone(),
            effective_date_start,
            regions: 0,
            products: 0,
            rejected: Vec::new(),
            summary: UpsertSummary::default(),
        };

        let mut seen: FxHashMap<ProductHash, ProductIdentity> = FxHashMap::default();
        let mut pending: Vec<Product> = Vec::new();

        for (region, region_catalog) in &catalog.regions {
            self.observer.on_region_start(region);
            report.regions += 1;

            for entry in region_catalog.entries() {
                let product =
                    match canonicalizer.canonicalize(&entry, region, effective_date_start) {
                        Ok(draft) => draft.seal(),
                        Err(error) => {
                            self.reject(&mut report, region, &entry, error.into());
                            continue;
                        }
                    };

                match seen.entry(product.product_hash().clone()) {
                    Entry::Occupied(existing) if existing.get() == product.identity() => {
                        let sku = product.sku().to_string();
                        self.reject(&mut report, region, &entry, EntryError::DuplicateSku { sku });
                        continue;
                    }
                    Entry::Occupied(existing) => {
                        return Err(PipelineError::HashCollision {
                            hash: existing.key().clone(),
                            existing: Box::new(existing.get().clone()),
                            incoming: Box::new(product.identity().clone()),
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(product.identity().clone());
                    }
                }

                self.observer.on_product(&product);
                report.products += 1;
                pending.push(product);
            }

            if self.batching == Batching::PerRegion {
                self.commit(Some(region), &mut pending, &mut report).await?;
            }
        }

        if self.batching == Batching::Global {
            self.commit(None, &mut pending, &mut report).await?;
        }

        self.observer.on_run_complete(&report);

        Ok(report)
    }

    fn reject(
        &self,
        report: &mut RunReport,
        region: &str,
        entry: &CatalogEntry<'_>,
        error: EntryError,
    ) {
        let rejected = RejectedEntry {
            region: region.to_string(),
            category: entry.category,
            name: entry.name.map(str::to_string),
            error,
        };

        self.observer.on_entry_rejected(&rejected);
        report.rejected.push(rejected);
    }

    async fn commit(
        &self,
        region: Option<&str>,
        pending: &mut Vec<Product>,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        if pending.is_empty() {
            return Ok(());
        }

        let summary = self
            .sink
            .upsert(pending)
            .await
            .map_err(|source| PipelineError::Sink {
                region: region.map(str::to_string),
                committed: report.summary,
                source,
            })?;

        report.summary += summary;
        self.observer.on_batch_committed(region, &summary);
        pending.clear();

        Ok(())
    }
}
