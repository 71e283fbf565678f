//! ezsql: a thin, synchronous convenience client for SQL servers.
//!
//! `DatabaseClient` formats SQL for database, table and record operations
//! and forwards it to a pluggable `Driver`. A rusqlite-backed
//! `SqliteDriver` ships with the crate.

// Core infrastructure modules
pub mod core;

// Client surface
pub mod client;
pub mod config;
pub mod logging;

#[cfg(test)]
mod test_utils;

pub use client::DatabaseClient;
pub use crate::core::db::{Credentials, Row, SqliteDriver, Value};
pub use crate::core::{DriverError, EzsqlError, Result};
