//! Products

use rustc_hash::FxHashMap;

use crate::{
    hashing::{ProductHash, price_hash, product_hash},
    prices::{Price, PriceQuote},
};

/// Extra discriminating facets of a product, e.g. its instance type.
pub type Attributes = FxHashMap<String, String>;

/// The fields that identify a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    /// Lowercase vendor slug
    pub vendor_name: String,

    /// Offering name, e.g. `Instance`
    pub service: String,

    /// Broad category, e.g. `Compute`
    pub product_family: String,

    /// Vendor region code
    pub region: String,

    /// Stable code, unique within vendor, region and service
    pub sku: String,

    /// Additional facets
    pub attributes: Attributes,
}

impl ProductIdentity {
    /// Hash the identity and each quote, producing an immutable product.
    pub fn seal(self, quotes: impl IntoIterator<Item = PriceQuote>) -> Product {
        let product_hash = product_hash(&self);

        let prices = quotes
            .into_iter()
            .map(|quote| {
                let hash = price_hash(&product_hash, &quote);
                Price::new(quote, hash)
            })
            .collect();

        Product {
            identity: self,
            product_hash,
            prices,
        }
    }
}

/// A canonical, hashed product with its prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    identity: ProductIdentity,

    product_hash: ProductHash,

    prices: Vec<Price>,
}

impl Product {
    /// Identity hash of this product.
    pub fn product_hash(&self) -> &ProductHash {
        &self.product_hash
    }

    /// Identity fields.
    pub fn identity(&self) -> &ProductIdentity {
        &self.identity
    }

    /// Prices in discovery order.
    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    /// Vendor slug.
    pub fn vendor_name(&self) -> &str {
        &self.identity.vendor_name
    }

    /// Offering name.
    pub fn service(&self) -> &str {
        &self.identity.service
    }

    /// Product family.
    pub fn product_family(&self) -> &str {
        &self.identity.product_family
    }

    /// Region code.
    pub fn region(&self) -> &str {
        &self.identity.region
    }

    /// Stable product code.
    pub fn sku(&self) -> &str {
        &self.identity.sku
    }

    /// Extra facets.
    pub fn attributes(&self) -> &Attributes {
        &self.identity.attributes
    }
}
