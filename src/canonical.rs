//! Canonicalization
//!
//! Maps raw vendor entries onto canonical product identities and price
//! quotes. Nothing here performs I/O.

use std::fmt;

use jiff::Timestamp;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::{
    prices::{Amount, AmountError, PriceQuote, PurchaseOption, UNIT_HOURS},
    products::{Attributes, Product, ProductIdentity},
    sources::CatalogEntry,
};

/// Attribute key holding the vendor's display name.
pub const TYPE_ATTRIBUTE: &str = "type";

const SKU_PREFIX: &str = "generated";

/// Canonicalization errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonicalizeError {
    /// The price string is not a non-negative decimal.
    #[error("malformed price {raw:?} for {vendor}/{region}/{sku}: {source}")]
    MalformedPrice {
        /// Vendor slug
        vendor: String,
        /// Region code
        region: String,
        /// Sku the entry would have had
        sku: String,
        /// The offending price string
        raw: String,
        /// Why it was rejected
        #[source]
        source: AmountError,
    },

    /// A named category entry has no name.
    #[error("{category} entry in {region} has no name")]
    MissingName {
        /// Category of the entry
        category: Category,
        /// Region code
        region: String,
    },

    /// The currency code is not a known ISO-4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The vendor slug is empty or not lowercase.
    #[error("invalid vendor slug: {0:?}")]
    InvalidVendor(String),
}

/// Kinds of entries a region catalog lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Virtual compute instance
    Instance,

    /// Dedicated Apple silicon machine
    AppleSilicon,

    /// Flat per-region flexible IP
    FlexibleIp,

    /// Load balancer
    LoadBalancer,
}

impl Category {
    /// All categories, in the order a region is walked.
    pub const ALL: [Category; 4] = [
        Category::Instance,
        Category::AppleSilicon,
        Category::FlexibleIp,
        Category::LoadBalancer,
    ];

    /// Canonical service name.
    pub fn service(self) -> &'static str {
        match self {
            Category::Instance => "Instance",
            Category::AppleSilicon => "Apple Silicon",
            Category::FlexibleIp => "Flexible IP",
            Category::LoadBalancer => "Load Balancer",
        }
    }

    /// Canonical product family.
    pub fn product_family(self) -> &'static str {
        match self {
            Category::Instance | Category::AppleSilicon | Category::FlexibleIp => "Compute",
            Category::LoadBalancer => "Network",
        }
    }

    /// Whether entries carry their own name, as opposed to one flat rate per region.
    pub fn is_named(self) -> bool {
        !matches!(self, Category::FlexibleIp)
    }

    /// Synthesized sku; named categories use the entry name.
    fn sku(self, name: Option<&str>) -> Option<String> {
        match (self, name) {
            (Category::FlexibleIp, _) => Some(format!("{SKU_PREFIX}-compute-flexible-ip")),
            (_, Some(name)) if !name.is_empty() => Some(format!("{SKU_PREFIX}-{name}")),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service())
    }
}

/// A canonical product and its quote, not yet hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Identity fields
    pub identity: ProductIdentity,

    /// The single quote discovered for this entry
    pub quote: PriceQuote,
}

impl ProductDraft {
    /// Hash the draft into an immutable product.
    pub fn seal(self) -> Product {
        self.identity.seal([self.quote])
    }
}

/// Canonicalizes entries for one vendor.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    vendor: String,
    currency: &'static Currency,
}

impl Canonicalizer {
    /// Create a canonicalizer for a vendor quoting in `currency`.
    ///
    /// # Errors
    ///
    /// - [`CanonicalizeError::InvalidVendor`]: the slug is empty or contains
    ///   anything but lowercase ASCII letters, digits and `-`.
    /// - [`CanonicalizeError::UnknownCurrency`]: the currency is not ISO-4217.
    pub fn new(vendor: &str, currency: &str) -> Result<Self, CanonicalizeError> {
        let valid_slug = !vendor.is_empty()
            && vendor
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

        if !valid_slug {
            return Err(CanonicalizeError::InvalidVendor(vendor.to_string()));
        }

        let currency = iso::find(currency)
            .ok_or_else(|| CanonicalizeError::UnknownCurrency(currency.to_string()))?;

        Ok(Self {
            vendor: vendor.to_string(),
            currency,
        })
    }

    /// Vendor slug.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Canonicalize one entry listed in `region`.
    ///
    /// # Errors
    ///
    /// - [`CanonicalizeError::MissingName`]: a named category entry has an empty name.
    /// - [`CanonicalizeError::MalformedPrice`]: the price is not a non-negative decimal.
    pub fn canonicalize(
        &self,
        entry: &CatalogEntry<'_>,
        region: &str,
        effective_date_start: Timestamp,
    ) -> Result<ProductDraft, CanonicalizeError> {
        let category = entry.category;

        let sku = category
            .sku(entry.name)
            .ok_or_else(|| CanonicalizeError::MissingName {
                category,
                region: region.to_string(),
            })?;

        let amount =
            Amount::parse(entry.price).map_err(|source| CanonicalizeError::MalformedPrice {
                vendor: self.vendor.clone(),
                region: region.to_string(),
                sku: sku.clone(),
                raw: entry.price.to_string(),
                source,
            })?;

        let mut attributes = Attributes::default();

        if category.is_named()
            && let Some(name) = entry.name
        {
            attributes.insert(TYPE_ATTRIBUTE.to_string(), name.to_string());
        }

        let identity = ProductIdentity {
            vendor_name: self.vendor.clone(),
            service: category.service().to_string(),
            product_family: category.product_family().to_string(),
            region: region.to_string(),
            sku,
            attributes,
        };

        let quote = PriceQuote::new(PurchaseOption::Standard, UNIT_HOURS, effective_date_start)
            .with_amount(self.currency, amount);

        Ok(ProductDraft { identity, quote })
    }
}
