//! Catalog
//!
//! The upsert contract every catalog store implements. Products and prices
//! are keyed by their identity hashes:
//!
//! - a product whose hash is already stored is matched, never re-inserted;
//! - a price whose hash is already stored is left alone, so re-scraping an
//!   unchanged price writes nothing;
//! - a batch is applied atomically.

use std::{
    error::Error as StdError,
    ops::{Add, AddAssign},
};

use thiserror::Error;

use crate::{
    hashing::{PriceHash, ProductHash},
    products::Product,
};

mod memory;

pub use memory::{InMemoryCatalog, StoredProduct};

/// Catalog store errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// The store rejected or could not accept the batch.
    #[error("catalog store unavailable: {0}")]
    Unavailable(#[source] Box<dyn StdError + Send + Sync>),

    /// A stored product with this hash has a different identity.
    #[error("product hash {0} already identifies a different product")]
    ProductHashCollision(ProductHash),

    /// A stored price with this hash belongs to a different product.
    #[error("price hash {0} already belongs to a different product")]
    PriceHashCollision(PriceHash),
}

impl SinkError {
    /// Wrap a storage backend error.
    pub fn unavailable(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Unavailable(error.into())
    }
}

/// Row counts from one upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Products stored for the first time
    pub products_inserted: usize,

    /// Products already stored under the same hash
    pub products_matched: usize,

    /// Prices stored for the first time
    pub prices_inserted: usize,

    /// Prices already stored under the same hash
    pub prices_unchanged: usize,
}

impl UpsertSummary {
    /// Rows newly written to the store.
    pub fn rows_written(&self) -> usize {
        self.products_inserted + self.prices_inserted
    }
}

impl Add for UpsertSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            products_inserted: self.products_inserted + rhs.products_inserted,
            products_matched: self.products_matched + rhs.products_matched,
            prices_inserted: self.prices_inserted + rhs.prices_inserted,
            prices_unchanged: self.prices_unchanged + rhs.prices_unchanged,
        }
    }
}

impl AddAssign for UpsertSummary {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A durable home for canonical products.
pub trait CatalogSink {
    /// Insert or match every product and its prices.
    ///
    /// # Errors
    ///
    /// - [`SinkError::Unavailable`]: the store failed; nothing from this batch
    ///   was committed.
    /// - [`SinkError::ProductHashCollision`] / [`SinkError::PriceHashCollision`]:
    ///   an identity hash already names something else; nothing from this
    ///   batch was committed.
    async fn upsert(&self, products: &[Product]) -> Result<UpsertSummary, SinkError>;
}

impl<S: CatalogSink + ?Sized> CatalogSink for &S {
    async fn upsert(&self, products: &[Product]) -> Result<UpsertSummary, SinkError> {
        (**self).upsert(products).await
    }
}
