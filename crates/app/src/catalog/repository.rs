//! Catalog Repository

use std::collections::BTreeMap;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use nimbus::{
    hashing::{PriceHash, ProductHash},
    prices::Price,
    products::Product,
};
use sqlx::{Postgres, Transaction, query_as, query_scalar, types::Json};

use super::records::{PriceRecord, ProductRecord, UpsertedProduct};

const UPSERT_PRODUCT_SQL: &str = include_str!("sql/upsert_product.sql");
const INSERT_PRICE_SQL: &str = include_str!("sql/insert_price.sql");
const GET_PRICE_OWNER_SQL: &str = include_str!("sql/get_price_owner.sql");
const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const LIST_PRICES_SQL: &str = include_str!("sql/list_prices.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the product, or touch `updated_at` when its hash is already stored.
    pub(crate) async fn upsert_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
    ) -> Result<UpsertedProduct, sqlx::Error> {
        query_as::<Postgres, UpsertedProduct>(UPSERT_PRODUCT_SQL)
            .bind(product.product_hash().as_str())
            .bind(product.vendor_name())
            .bind(product.service())
            .bind(product.product_family())
            .bind(product.region())
            .bind(product.sku())
            .bind(Json(product.attributes()))
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert the price unless its hash is already stored. Returns whether a
    /// row was written.
    pub(crate) async fn insert_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &ProductHash,
        price: &Price,
    ) -> Result<bool, sqlx::Error> {
        let amounts: BTreeMap<&str, &str> = price
            .quote()
            .amounts
            .iter()
            .map(|(code, amount)| (code.as_str(), amount.as_str()))
            .collect();

        let inserted: Option<String> = query_scalar(INSERT_PRICE_SQL)
            .bind(price.price_hash().as_str())
            .bind(product.as_str())
            .bind(price.purchase_option().as_str())
            .bind(price.unit())
            .bind(SqlxTimestamp::from(price.effective_date_start()))
            .bind(Json(amounts))
            .fetch_optional(&mut **tx)
            .await?;

        Ok(inserted.is_some())
    }

    pub(crate) async fn price_owner(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        price: &PriceHash,
    ) -> Result<ProductHash, sqlx::Error> {
        let owner: String = query_scalar(GET_PRICE_OWNER_SQL)
            .bind(price.as_str())
            .fetch_one(&mut **tx)
            .await?;

        Ok(ProductHash::from_stored(owner))
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_prices(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &ProductHash,
    ) -> Result<Vec<PriceRecord>, sqlx::Error> {
        query_as::<Postgres, PriceRecord>(LIST_PRICES_SQL)
            .bind(product.as_str())
            .fetch_all(&mut **tx)
            .await
    }
}
