//! Built-in vendor tables

use super::{SourceError, VendorCatalog, VendorSource};

const SCALEWAY: &str = include_str!("../../fixtures/vendors/scaleway.yml");

/// Vendor tables embedded in the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinSource {
    /// Scaleway public price list
    Scaleway,
}

impl BuiltinSource {
    /// Look a table up by vendor slug.
    pub fn from_vendor(vendor: &str) -> Option<Self> {
        match vendor {
            "scaleway" => Some(Self::Scaleway),
            _ => None,
        }
    }

    fn contents(self) -> &'static str {
        match self {
            Self::Scaleway => SCALEWAY,
        }
    }
}

impl VendorSource for BuiltinSource {
    fn load(&self) -> Result<VendorCatalog, SourceError> {
        VendorCatalog::from_yaml_str(self.contents())
    }
}
