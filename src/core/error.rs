/// Ezsql Error Module
///
/// This module defines the error types for the ezsql client. Every failure
/// scenario of the client maps onto exactly one `EzsqlError` variant, each
/// carrying a human-readable message. Driver-level failures are described
/// separately by `DriverError` and converted at each client call boundary.
use thiserror::Error;

/// Error type returned by every `DatabaseClient` operation.
///
/// Each domain variant carries its message; the constructors without
/// arguments (`EzsqlError::table_not_found()` and friends) supply the
/// default text for that kind.
#[derive(Error, Debug)]
pub enum EzsqlError {
    /// The server-scope connection could not be established
    #[error("{0}")]
    ServerConnection(String),

    /// No database is selected, or the selection itself failed
    #[error("{0}")]
    DatabaseSelection(String),

    /// A CREATE DATABASE statement failed
    #[error("{0}")]
    DatabaseCreate(String),

    /// A DROP DATABASE statement failed
    #[error("{0}")]
    DatabaseDrop(String),

    /// The table could not be created (pre-check or driver failure)
    #[error("{0}")]
    TableCreate(String),

    /// An INSERT failed; carries the driver's message
    #[error("{0}")]
    RecordAdding(String),

    /// The named table does not exist in the selected database
    #[error("{0}")]
    TableNotFound(String),

    /// A statement against an existing table failed
    #[error("{0}")]
    TableAccess(String),

    /// Unclassified driver failure from a listing query
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EzsqlError {
    pub fn server_connection() -> Self {
        EzsqlError::ServerConnection("Error when connecting to database server.".to_string())
    }

    pub fn database_selection() -> Self {
        EzsqlError::DatabaseSelection("Database selection error.".to_string())
    }

    pub fn database_create() -> Self {
        EzsqlError::DatabaseCreate("Error when creating database.".to_string())
    }

    pub fn database_drop() -> Self {
        EzsqlError::DatabaseDrop("Error when deleting database.".to_string())
    }

    pub fn table_create() -> Self {
        EzsqlError::TableCreate("Error when creating table.".to_string())
    }

    pub fn record_adding() -> Self {
        EzsqlError::RecordAdding("Error when inserting record.".to_string())
    }

    pub fn table_not_found() -> Self {
        EzsqlError::TableNotFound("Selected table does not exists.".to_string())
    }

    pub fn table_access() -> Self {
        EzsqlError::TableAccess("Error when accessing table.".to_string())
    }
}

/// Failures reported by a `Driver`, its connections or cursors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Errors raised by SQLite itself
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File system errors while managing database files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can't connect to server on '{0}'")]
    Unreachable(String),

    #[error("Access denied for user '{0}'")]
    AccessDenied(String),

    #[error("Unknown database '{0}'")]
    UnknownDatabase(String),

    #[error("Can't create database '{0}'; database exists")]
    DatabaseExists(String),

    #[error("No database selected")]
    NoDatabaseSelected,

    /// Anything else a driver wants to report verbatim
    #[error("{0}")]
    Other(String),
}

/// Type alias for Result to use EzsqlError as the error type.
pub type Result<T> = std::result::Result<T, EzsqlError>;

/// Type alias for results produced at the driver layer.
pub type DriverResult<T> = std::result::Result<T, DriverError>;
