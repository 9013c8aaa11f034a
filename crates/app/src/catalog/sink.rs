//! `PostgreSQL` catalog sink.

use nimbus::{
    catalog::{CatalogSink, SinkError, UpsertSummary},
    hashing::ProductHash,
    products::Product,
};
use sqlx::PgPool;

use super::{
    errors::CatalogStoreError,
    records::{PriceRecord, ProductRecord},
    repository::PgCatalogRepository,
};

/// Catalog sink backed by `PostgreSQL`. Each batch runs in one transaction.
#[derive(Debug, Clone)]
pub struct PgCatalogSink {
    pool: PgPool,
    repository: PgCatalogRepository,
}

impl PgCatalogSink {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            repository: PgCatalogRepository::new(),
        }
    }

    /// Upsert a batch of products and their prices.
    ///
    /// # Errors
    ///
    /// Returns a collision error when a stored hash names something else, or
    /// a storage error. Either way the transaction is rolled back.
    pub async fn upsert_batch(
        &self,
        products: &[Product],
    ) -> Result<UpsertSummary, CatalogStoreError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = UpsertSummary::default();

        for product in products {
            let hash = product.product_hash();
            let upserted = self.repository.upsert_product(&mut tx, product).await?;

            if upserted.identity != *product.identity() {
                return Err(CatalogStoreError::ProductHashCollision(hash.clone()));
            }

            if upserted.inserted {
                summary.products_inserted += 1;
            } else {
                summary.products_matched += 1;
            }

            for price in product.prices() {
                if self.repository.insert_price(&mut tx, hash, price).await? {
                    summary.prices_inserted += 1;
                    continue;
                }

                let owner = self
                    .repository
                    .price_owner(&mut tx, price.price_hash())
                    .await?;

                if owner != *hash {
                    return Err(CatalogStoreError::PriceHashCollision(
                        price.price_hash().clone(),
                    ));
                }

                summary.prices_unchanged += 1;
            }
        }

        tx.commit().await?;

        Ok(summary)
    }

    /// Every stored product, ordered by hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn products(&self) -> Result<Vec<ProductRecord>, CatalogStoreError> {
        let mut tx = self.pool.begin().await?;

        let products = self.repository.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    /// Price rows of one product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn prices(&self, product: &ProductHash) -> Result<Vec<PriceRecord>, CatalogStoreError> {
        let mut tx = self.pool.begin().await?;

        let prices = self.repository.list_prices(&mut tx, product).await?;

        tx.commit().await?;

        Ok(prices)
    }
}

impl CatalogSink for PgCatalogSink {
    async fn upsert(&self, products: &[Product]) -> Result<UpsertSummary, SinkError> {
        Ok(self.upsert_batch(products).await?)
    }
}
