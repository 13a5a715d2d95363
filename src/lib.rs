//! Library surface exposed for criterion benchmarks and integration testing.
//! The binary entry point lives in src/main.rs.

pub mod config;
pub mod db;
pub mod error;
pub mod explain;
pub mod schema;
pub mod server;
pub mod tips;
#[cfg(test)]
pub mod test_helpers;
#[cfg(test)]
mod e2e_test_utils;
