//! YAML file source

use std::{fs, path::PathBuf};

use super::{SourceError, VendorCatalog, VendorSource};

/// Reads a vendor catalog from a YAML file on every load.
#[derive(Debug, Clone)]
pub struct YamlSource {
    path: PathBuf,
}

impl YamlSource {
    /// Create a source for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VendorSource for YamlSource {
    fn load(&self) -> Result<VendorCatalog, SourceError> {
        let contents = fs::read_to_string(&self.path)?;

        VendorCatalog::from_yaml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn loads_catalog_from_file() -> TestResult {
        let mut file = NamedTempFile::new()?;

        writeln!(
            file,
            "vendor: scaleway\ncurrency: EUR\nregions:\n  fr-par-1:\n    network:\n      load_balancer:\n        - name: LB-S\n          price: \"0.014\""
        )?;

        let catalog = YamlSource::new(file.path()).load()?;
        let region = catalog.regions.get("fr-par-1").ok_or("missing region")?;

        assert_eq!(region.network.load_balancer.len(), 1);

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = YamlSource::new("./does/not/exist.yml").load();

        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
