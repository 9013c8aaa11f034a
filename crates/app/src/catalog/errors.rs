//! Catalog store errors.

use nimbus::{
    catalog::SinkError,
    hashing::{PriceHash, ProductHash},
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// `PostgreSQL` catalog errors
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    /// A stored product with this hash has a different identity.
    #[error("product hash {0} already identifies a different product")]
    ProductHashCollision(ProductHash),

    /// A stored price with this hash belongs to a different product.
    #[error("price hash {0} already belongs to a different product")]
    PriceHashCollision(PriceHash),

    /// A price referenced a product row that does not exist.
    #[error("related resource not found")]
    InvalidReference,

    /// A required column was null.
    #[error("missing required data")]
    MissingRequiredData,

    /// A row failed a check constraint.
    #[error("invalid data")]
    InvalidData,

    /// Any other storage failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CatalogStoreError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<CatalogStoreError> for SinkError {
    fn from(error: CatalogStoreError) -> Self {
        match error {
            CatalogStoreError::ProductHashCollision(hash) => Self::ProductHashCollision(hash),
            CatalogStoreError::PriceHashCollision(hash) => Self::PriceHashCollision(hash),
            other => Self::unavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collisions_stay_collisions() {
        let hash = ProductHash::from_stored("ab".repeat(32));

        let error = SinkError::from(CatalogStoreError::ProductHashCollision(hash.clone()));

        assert!(
            matches!(error, SinkError::ProductHashCollision(ref inner) if *inner == hash),
            "expected ProductHashCollision, got {error:?}"
        );
    }

    #[test]
    fn storage_failures_become_unavailable() {
        let error = SinkError::from(CatalogStoreError::from(Error::PoolTimedOut));

        assert!(
            matches!(error, SinkError::Unavailable(_)),
            "expected Unavailable, got {error:?}"
        );
        assert_eq!(error.to_string(), "catalog store unavailable: storage error");
    }
}
