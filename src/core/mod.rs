/// Core Module for ezsql
///
/// Shared infrastructure under the client: the driver abstraction and its
/// bundled SQLite implementation, SQL assembly, and the error types.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DriverError, DriverResult, EzsqlError, Result};
