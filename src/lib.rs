//! Nimbus
//!
//! Nimbus turns vendor cloud-pricing tables into canonical, content-hashed
//! products and prices, and upserts them into a catalog store so that
//! re-ingesting an unchanged table writes nothing.

pub mod canonical;
pub mod catalog;
pub mod hashing;
pub mod observer;
pub mod pipeline;
pub mod prices;
pub mod products;
pub mod sources;
