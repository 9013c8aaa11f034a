//! Catalog Records

use std::collections::BTreeMap;

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use nimbus::{
    hashing::{PriceHash, ProductHash},
    prices::PurchaseOption,
    products::{Attributes, ProductIdentity},
};
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};

/// Product row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_hash: ProductHash,
    pub identity: ProductIdentity,
    pub created_at: Timestamp,

    /// Last time an ingestion run matched the product
    pub updated_at: Timestamp,
}

/// Price row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub price_hash: PriceHash,
    pub product_hash: ProductHash,
    pub purchase_option: PurchaseOption,
    pub unit: String,
    pub effective_date_start: Timestamp,

    /// ISO-4217 code -> amount as the vendor supplied it
    pub amounts: BTreeMap<String, String>,
    pub created_at: Timestamp,
}

/// Identity columns returned by a product upsert.
#[derive(Debug, Clone)]
pub(crate) struct UpsertedProduct {
    pub(crate) identity: ProductIdentity,
    pub(crate) inserted: bool,
}

fn identity_from_row(row: &PgRow) -> sqlx::Result<ProductIdentity> {
    Ok(ProductIdentity {
        vendor_name: row.try_get("vendor_name")?,
        service: row.try_get("service")?,
        product_family: row.try_get("product_family")?,
        region: row.try_get("region")?,
        sku: row.try_get("sku")?,
        attributes: row.try_get::<Json<Attributes>, _>("attributes")?.0,
    })
}

impl<'r> FromRow<'r, PgRow> for UpsertedProduct {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            identity: identity_from_row(row)?,
            inserted: row.try_get("inserted")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_hash: ProductHash::from_stored(row.try_get::<String, _>("product_hash")?),
            identity: identity_from_row(row)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PriceRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            price_hash: PriceHash::from_stored(row.try_get::<String, _>("price_hash")?),
            product_hash: ProductHash::from_stored(row.try_get::<String, _>("product_hash")?),
            purchase_option: PurchaseOption::from(row.try_get::<&str, _>("purchase_option")?),
            unit: row.try_get("unit")?,
            effective_date_start: row
                .try_get::<SqlxTimestamp, _>("effective_date_start")?
                .to_jiff(),
            amounts: row.try_get::<Json<BTreeMap<String, String>>, _>("amounts")?.0,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
