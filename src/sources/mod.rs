//! Vendor Sources
//!
//! A source supplies one vendor's raw per-region catalog. Where the data
//! comes from (an embedded table, a YAML file, a scraped page) is the
//! source's business; the pipeline only sees a [`VendorCatalog`].

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::canonical::Category;

mod builtin;
mod yaml;

pub use builtin::BuiltinSource;
pub use yaml::YamlSource;

/// Source loading errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// IO error reading a source file
    #[error("failed to read vendor source: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse vendor source: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Supplies raw vendor catalogs.
pub trait VendorSource {
    /// Load the vendor's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load(&self) -> Result<VendorCatalog, SourceError>;
}

/// One vendor's raw catalog across regions.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct VendorCatalog {
    /// Lowercase vendor slug
    pub vendor: String,

    /// ISO-4217 code of the currency prices are quoted in
    pub currency: String,

    /// Region code -> catalog
    #[serde(default)]
    pub regions: BTreeMap<String, RegionCatalog>,
}

impl VendorCatalog {
    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a catalog.
    pub fn from_yaml_str(contents: &str) -> Result<Self, SourceError> {
        Ok(serde_norway::from_str(contents)?)
    }
}

/// A catalog value is its own source.
impl VendorSource for VendorCatalog {
    fn load(&self) -> Result<VendorCatalog, SourceError> {
        Ok(self.clone())
    }
}

/// Raw catalog of a single region.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RegionCatalog {
    /// Compute offerings
    #[serde(default)]
    pub compute: ComputeCatalog,

    /// Network offerings
    #[serde(default)]
    pub network: NetworkCatalog,
}

/// Compute section of a region catalog.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ComputeCatalog {
    /// Virtual instances
    #[serde(default)]
    pub instance: Vec<RawEntry>,

    /// Dedicated Apple silicon machines
    #[serde(default)]
    pub apple_silicon: Vec<RawEntry>,

    /// Flat per-region flexible IP rate
    #[serde(default)]
    pub flexible_ip: Option<FlatRate>,
}

/// Network section of a region catalog.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NetworkCatalog {
    /// Load balancers
    #[serde(default)]
    pub load_balancer: Vec<RawEntry>,
}

/// A named, priced entry as the vendor lists it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    /// Display name, e.g. `GP1-XS`
    pub name: String,

    /// Decimal price string
    pub price: String,
}

impl RawEntry {
    /// Creates a raw entry.
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }
}

/// A price with no per-item name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FlatRate {
    /// Decimal price string
    pub price: String,
}

/// A raw entry tagged with its category, borrowed from a [`RegionCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry<'a> {
    /// Category the entry was listed under
    pub category: Category,

    /// Display name; `None` for flat rates
    pub name: Option<&'a str>,

    /// Decimal price string
    pub price: &'a str,
}

impl RegionCatalog {
    /// Flatten the region into entries, category by category.
    pub fn entries(&self) -> Vec<CatalogEntry<'_>> {
        let mut entries: Vec<CatalogEntry<'_>> =
            named(Category::Instance, &self.compute.instance).collect();

        entries.extend(named(Category::AppleSilicon, &self.compute.apple_silicon));

        if let Some(flexible_ip) = &self.compute.flexible_ip {
            entries.push(CatalogEntry {
                category: Category::FlexibleIp,
                name: None,
                price: flexible_ip.price.as_str(),
            });
        }

        entries.extend(named(Category::LoadBalancer, &self.network.load_balancer));

        entries
    }
}

fn named(category: Category, entries: &[RawEntry]) -> impl Iterator<Item = CatalogEntry<'_>> {
    entries.iter().map(move |entry| CatalogEntry {
        category,
        name: Some(entry.name.as_str()),
        price: entry.price.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const CATALOG: &str = r#"
vendor: scaleway
currency: EUR
regions:
  fr-par-1:
    compute:
      instance:
        - name: GP1-XS
          price: "0.082"
      apple_silicon:
        - name: M1-M
          price: "0.10"
      flexible_ip:
        price: "0.002"
    network:
      load_balancer:
        - name: LB-S
          price: "0.014"
  nl-ams-1:
    compute:
      instance:
        - name: DEV1-S
          price: "0.008"
"#;

    #[test]
    fn parses_yaml_catalog() -> TestResult {
        let catalog = VendorCatalog::from_yaml_str(CATALOG)?;

        assert_eq!(catalog.vendor, "scaleway");
        assert_eq!(catalog.currency, "EUR");
        assert_eq!(catalog.regions.len(), 2);

        let ams = catalog.regions.get("nl-ams-1").ok_or("missing region")?;

        assert_eq!(ams.compute.instance, [RawEntry::new("DEV1-S", "0.008")]);
        assert!(ams.compute.flexible_ip.is_none());
        assert!(ams.network.load_balancer.is_empty());

        Ok(())
    }

    #[test]
    fn entries_walk_categories_in_order() -> TestResult {
        let catalog = VendorCatalog::from_yaml_str(CATALOG)?;
        let par = catalog.regions.get("fr-par-1").ok_or("missing region")?;

        let entries = par.entries();
        let categories: Vec<Category> = entries.iter().map(|entry| entry.category).collect();

        assert_eq!(
            categories,
            [
                Category::Instance,
                Category::AppleSilicon,
                Category::FlexibleIp,
                Category::LoadBalancer,
            ]
        );

        let flexible_ip = entries
            .iter()
            .find(|entry| entry.category == Category::FlexibleIp)
            .ok_or("missing flexible ip")?;

        assert_eq!(flexible_ip.name, None);
        assert_eq!(flexible_ip.price, "0.002");

        Ok(())
    }

    #[test]
    fn quoted_prices_keep_trailing_zeros() -> TestResult {
        let catalog = VendorCatalog::from_yaml_str(
            "vendor: v\ncurrency: EUR\nregions:\n  r:\n    compute:\n      flexible_ip:\n        price: \"0.10\"\n",
        )?;

        let region = catalog.regions.get("r").ok_or("missing region")?;
        let rate = region.compute.flexible_ip.as_ref().ok_or("missing rate")?;

        assert_eq!(rate.price, "0.10");

        Ok(())
    }

    #[test]
    fn malformed_yaml_is_a_source_error() {
        let result = VendorCatalog::from_yaml_str("vendor: [unterminated");

        assert!(matches!(result, Err(SourceError::Yaml(_))));
    }

    #[test]
    fn catalog_value_is_a_source() -> TestResult {
        let catalog = VendorCatalog::from_yaml_str(CATALOG)?;

        assert_eq!(catalog.load()?, catalog);

        Ok(())
    }
}
