/// Database Module
///
/// The driver-facing half of ezsql, organized into focused submodules:
/// - **Driver Abstraction** (`driver.rs`): the `Driver`/`Connection`/`Cursor` traits and `Credentials`
/// - **Values** (`value.rs`): column values and rows exchanged with a driver
/// - **Query Assembly** (`query.rs`): SQL text for every client operation
/// - **Table Schema** (`schema.rs`): column definitions for CREATE TABLE
/// - **SQLite Driver** (`sqlite.rs`): a bundled `Driver` backed by rusqlite
///
/// ## Error Handling
///
/// Drivers report `DriverError`; the client converts those into `EzsqlError`.
pub mod driver;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use driver::*;
pub use schema::*;
pub use sqlite::{SqliteConnection, SqliteCursor, SqliteDriver};
pub use value::*;
