//! `PostgreSQL` catalog

pub mod errors;
pub mod records;
mod repository;
mod sink;

pub use errors::CatalogStoreError;
pub use sink::PgCatalogSink;
