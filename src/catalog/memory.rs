//! In-memory catalog

use std::{
    collections::hash_map::Entry,
    sync::{Mutex, PoisonError},
};

use rustc_hash::FxHashMap;

use crate::{
    hashing::{PriceHash, ProductHash},
    prices::Price,
    products::{Product, ProductIdentity},
};

use super::{CatalogSink, SinkError, UpsertSummary};

/// A product row as the catalog holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProduct {
    /// Identity hash
    pub product_hash: ProductHash,

    /// Identity fields
    pub identity: ProductIdentity,

    /// Price rows in insertion order
    pub prices: Vec<Price>,
}

#[derive(Debug, Default)]
struct CatalogState {
    products: FxHashMap<ProductHash, StoredProduct>,
    price_owners: FxHashMap<PriceHash, ProductHash>,
}

/// Catalog held in process memory.
///
/// Upserts take a single lock, so concurrent upserts of the same hash are
/// serialized and a batch is applied all at once or not at all.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored product, ordered by hash.
    pub fn products(&self) -> Vec<StoredProduct> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut products: Vec<StoredProduct> = state.products.values().cloned().collect();

        products.sort_by(|a, b| a.product_hash.cmp(&b.product_hash));

        products
    }

    /// A single stored product.
    pub fn product(&self, hash: &ProductHash) -> Option<StoredProduct> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.products.get(hash).cloned()
    }

    /// Number of product rows.
    pub fn product_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.products.len()
    }

    /// Number of price rows.
    pub fn price_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.price_owners.len()
    }
}

impl CatalogState {
    fn check_collisions(&self, products: &[Product]) -> Result<(), SinkError> {
        let mut identities: FxHashMap<&ProductHash, &ProductIdentity> = FxHashMap::default();
        let mut owners: FxHashMap<&PriceHash, &ProductHash> = FxHashMap::default();

        for product in products {
            let hash = product.product_hash();

            let existing = self
                .products
                .get(hash)
                .map(|stored| &stored.identity)
                .or_else(|| identities.get(hash).copied());

            if existing.is_some_and(|identity| identity != product.identity()) {
                return Err(SinkError::ProductHashCollision(hash.clone()));
            }

            identities.insert(hash, product.identity());

            for price in product.prices() {
                let price_hash = price.price_hash();

                let owner = self
                    .price_owners
                    .get(price_hash)
                    .or_else(|| owners.get(price_hash).copied());

                if owner.is_some_and(|owner| owner != hash) {
                    return Err(SinkError::PriceHashCollision(price_hash.clone()));
                }

                owners.insert(price_hash, hash);
            }
        }

        Ok(())
    }

    fn apply(&mut self, products: &[Product]) -> UpsertSummary {
        let mut summary = UpsertSummary::default();

        for product in products {
            let hash = product.product_hash();

            let stored = match self.products.entry(hash.clone()) {
                Entry::Occupied(entry) => {
                    summary.products_matched += 1;
                    entry.into_mut()
                }
                Entry::Vacant(entry) => {
                    summary.products_inserted += 1;
                    entry.insert(StoredProduct {
                        product_hash: hash.clone(),
                        identity: product.identity().clone(),
                        prices: Vec::new(),
                    })
                }
            };

            for price in product.prices() {
                if self.price_owners.contains_key(price.price_hash()) {
                    summary.prices_unchanged += 1;
                    continue;
                }

                self.price_owners
                    .insert(price.price_hash().clone(), hash.clone());
                stored.prices.push(price.clone());
                summary.prices_inserted += 1;
            }
        }

        summary
    }
}

impl CatalogSink for InMemoryCatalog {
    async fn upsert(&self, products: &[Product]) -> Result<UpsertSummary, SinkError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.check_collisions(products)?;

        Ok(state.apply(products))
    }
}
