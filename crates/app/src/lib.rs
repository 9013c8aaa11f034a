//! Nimbus application: `PostgreSQL` catalog store, configuration, logging and
//! the commands behind the `nimbus-app` binary.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod database;
pub mod errors;
pub mod observability;
pub mod report;

#[cfg(test)]
mod test;
