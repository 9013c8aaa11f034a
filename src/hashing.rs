//! Identity Hashing
//!
//! Product and price identities are SHA-256 digests over a fixed binary
//! serialization, rendered as 64 lowercase hex characters.
//!
//! The byte stream starts with an ASCII domain tag (`nimbus.product.v1` or
//! `nimbus.price.v1`). Every string field follows as a frame: its UTF-8 byte
//! length as a 4-byte big-endian integer, then the bytes. A map is written as
//! a 4-byte big-endian entry count followed by a key frame and a value frame
//! per entry, in ascending byte order of the keys.
//!
//! - Product fields: vendor name, service, product family, region, sku,
//!   attributes.
//! - Price fields: owning product hash (hex), purchase option, unit,
//!   amounts (currency code -> amount as supplied).
//!
//! The effective date of a price is not part of its identity.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::{prices::PriceQuote, products::ProductIdentity};

const PRODUCT_DOMAIN: &[u8] = b"nimbus.product.v1";
const PRICE_DOMAIN: &[u8] = b"nimbus.price.v1";

/// Identity hash of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductHash(String);

/// Identity hash of a price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceHash(String);

macro_rules! hash_string {
    ($name:ident) => {
        impl $name {
            /// Hex digest.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wraps a digest read back from storage.
            pub fn from_stored(hex: impl Into<String>) -> Self {
                Self(hex.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hash_string!(ProductHash);
hash_string!(PriceHash);

/// Computes the identity hash of a product.
pub fn product_hash(identity: &ProductIdentity) -> ProductHash {
    let mut hasher = Sha256::new();

    hasher.update(PRODUCT_DOMAIN);
    frame(&mut hasher, &identity.vendor_name);
    frame(&mut hasher, &identity.service);
    frame(&mut hasher, &identity.product_family);
    frame(&mut hasher, &identity.region);
    frame(&mut hasher, &identity.sku);
    map(
        &mut hasher,
        identity
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    ProductHash(format!("{:x}", hasher.finalize()))
}

/// Computes the identity hash of a price owned by `product`.
pub fn price_hash(product: &ProductHash, quote: &PriceQuote) -> PriceHash {
    let mut hasher = Sha256::new();

    hasher.update(PRICE_DOMAIN);
    frame(&mut hasher, product.as_str());
    frame(&mut hasher, quote.purchase_option.as_str());
    frame(&mut hasher, &quote.unit);
    map(
        &mut hasher,
        quote
            .amounts
            .iter()
            .map(|(code, amount)| (code.as_str(), amount.as_str())),
    );

    PriceHash(format!("{:x}", hasher.finalize()))
}

fn frame(hasher: &mut Sha256, field: &str) {
    hasher.update(length_prefix(field.len()));
    hasher.update(field.as_bytes());
}

fn map<'a>(hasher: &mut Sha256, entries: impl Iterator<Item = (&'a str, &'a str)>) {
    let mut entries: Vec<(&str, &str)> = entries.collect();

    entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    hasher.update(length_prefix(entries.len()));

    for (key, value) in entries {
        frame(hasher, key);
        frame(hasher, value);
    }
}

fn length_prefix(len: usize) -> [u8; 4] {
    // Vendor fields are nowhere near 4 GiB.
    u32::try_from(len).unwrap_or(u32::MAX).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rustc_hash::FxHashMap;
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::prices::{Amount, PurchaseOption, UNIT_HOURS};

    use super::*;

    fn identity(attributes: &[(&str, &str)]) -> ProductIdentity {
        ProductIdentity {
            vendor_name: "scaleway".to_string(),
            service: "Instance".to_string(),
            product_family: "Compute".to_string(),
            region: "fr-par-1".to_string(),
            sku: "generated-GP1-XS".to_string(),
            attributes: attributes
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        }
    }

    fn quote(amount: &str, at: Timestamp) -> Result<PriceQuote, crate::prices::AmountError> {
        Ok(PriceQuote::new(PurchaseOption::Standard, UNIT_HOURS, at)
            .with_amount(iso::EUR, Amount::parse(amount)?))
    }

    #[test]
    fn product_hash_is_lowercase_hex_sha256() {
        let hash = product_hash(&identity(&[("type", "GP1-XS")]));

        assert_eq!(hash.as_str().len(), 64);
        assert!(
            hash.as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        );
    }

    #[test]
    fn hashes_match_published_values() -> TestResult {
        let product = product_hash(&identity(&[("type", "GP1-XS")]));

        assert_eq!(
            product.as_str(),
            "57e7ab1ebe35d1dd2bb18abd2fc103c2ecb0ad11db4bc3ab2c1449c202f6b8b6"
        );

        let price = price_hash(&product, &quote("0.082", Timestamp::UNIX_EPOCH)?);

        assert_eq!(
            price.as_str(),
            "615241592a2694986ee1087e1024feaa500a1b831b7574dc9a55f365ce882fbb"
        );

        Ok(())
    }

    #[test]
    fn product_hash_is_deterministic() {
        let a = product_hash(&identity(&[("type", "GP1-XS")]));
        let b = product_hash(&identity(&[("type", "GP1-XS")]));

        assert_eq!(a, b);
    }

    #[test]
    fn product_hash_ignores_attribute_insertion_order() {
        let mut forward = FxHashMap::default();
        forward.insert("type".to_string(), "GP1-XS".to_string());
        forward.insert("arch".to_string(), "x86_64".to_string());
        forward.insert("zone".to_string(), "a".to_string());

        let mut backward = FxHashMap::default();
        backward.insert("zone".to_string(), "a".to_string());
        backward.insert("arch".to_string(), "x86_64".to_string());
        backward.insert("type".to_string(), "GP1-XS".to_string());

        let a = ProductIdentity {
            attributes: forward,
            ..identity(&[])
        };
        let b = ProductIdentity {
            attributes: backward,
            ..identity(&[])
        };

        assert_eq!(product_hash(&a), product_hash(&b));
    }

    #[test]
    fn product_hash_changes_with_any_identity_field() {
        let base = identity(&[("type", "GP1-XS")]);
        let hash = product_hash(&base);

        let variants = [
            ProductIdentity {
                vendor_name: "other".to_string(),
                ..base.clone()
            },
            ProductIdentity {
                service: "Apple Silicon".to_string(),
                ..base.clone()
            },
            ProductIdentity {
                product_family: "Network".to_string(),
                ..base.clone()
            },
            ProductIdentity {
                region: "nl-ams-1".to_string(),
                ..base.clone()
            },
            ProductIdentity {
                sku: "generated-GP1-S".to_string(),
                ..base.clone()
            },
            identity(&[("type", "GP1-S")]),
            identity(&[]),
        ];

        for variant in variants {
            assert_ne!(product_hash(&variant), hash, "{variant:?}");
        }
    }

    #[test]
    fn framing_keeps_field_boundaries() {
        let a = ProductIdentity {
            service: "Inst".to_string(),
            product_family: "anceCompute".to_string(),
            ..identity(&[])
        };
        let b = ProductIdentity {
            service: "Instance".to_string(),
            product_family: "Compute".to_string(),
            ..identity(&[])
        };

        assert_ne!(product_hash(&a), product_hash(&b));
    }

    #[test]
    fn empty_attributes_differ_from_empty_valued_attribute() {
        assert_ne!(
            product_hash(&identity(&[])),
            product_hash(&identity(&[("", "")]))
        );
    }

    #[test]
    fn price_hash_ignores_effective_date() -> TestResult {
        let product = product_hash(&identity(&[("type", "GP1-XS")]));

        let monday = price_hash(&product, &quote("0.082", Timestamp::UNIX_EPOCH)?);
        let tuesday = price_hash(&product, &quote("0.082", Timestamp::from_second(86_400)?)?);

        assert_eq!(monday, tuesday);

        Ok(())
    }

    #[test]
    fn price_hash_tracks_amount_and_owner() -> TestResult {
        let product = product_hash(&identity(&[("type", "GP1-XS")]));
        let other = product_hash(&identity(&[("type", "GP1-S")]));
        let at = Timestamp::UNIX_EPOCH;

        let base = price_hash(&product, &quote("0.082", at)?);

        assert_ne!(base, price_hash(&product, &quote("0.083", at)?));
        assert_ne!(base, price_hash(&other, &quote("0.082", at)?));

        Ok(())
    }

    #[test]
    fn price_hash_tracks_purchase_option_and_unit() -> TestResult {
        let product = product_hash(&identity(&[]));
        let at = Timestamp::UNIX_EPOCH;
        let base = quote("1", at)?;

        let reserved = PriceQuote {
            purchase_option: PurchaseOption::from("reserved"),
            ..base.clone()
        };
        let monthly = PriceQuote {
            unit: "months".to_string(),
            ..base.clone()
        };

        let hash = price_hash(&product, &base);

        assert_ne!(hash, price_hash(&product, &reserved));
        assert_ne!(hash, price_hash(&product, &monthly));

        Ok(())
    }

    #[test]
    fn price_hash_ignores_currency_insertion_order() -> TestResult {
        let product = product_hash(&identity(&[]));
        let at = Timestamp::UNIX_EPOCH;

        let eur_first = PriceQuote::new(PurchaseOption::Standard, UNIT_HOURS, at)
            .with_amount(iso::EUR, Amount::parse("1.00")?)
            .with_amount(iso::USD, Amount::parse("1.08")?);
        let usd_first = PriceQuote::new(PurchaseOption::Standard, UNIT_HOURS, at)
            .with_amount(iso::USD, Amount::parse("1.08")?)
            .with_amount(iso::EUR, Amount::parse("1.00")?);

        assert_eq!(
            price_hash(&product, &eur_first),
            price_hash(&product, &usd_first)
        );

        Ok(())
    }
}
