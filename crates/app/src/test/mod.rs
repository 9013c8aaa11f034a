//! Test infrastructure


pub use db::TestDb;
