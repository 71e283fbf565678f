/// Driver Abstraction Module
///
/// The client never talks to a server directly. It goes through these three
/// traits, which model an eagerly-connecting, synchronous, cursor-based
/// relational driver:
/// - `Driver::connect` opens a `Connection`, optionally scoped to a database
/// - `Connection::cursor` hands out a fresh `Cursor` per statement
/// - `Cursor::execute` runs one statement with positional parameters
use crate::core::db::value::{Row, Value};
use crate::core::DriverResult;
use std::fmt;

/// Server address and login used for every connection a client opens.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            host: host.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens connections to a database server.
pub trait Driver {
    type Connection: Connection;

    /// Connects to the server. With `database` set, the connection is
    /// scoped to that database and fails if it does not exist.
    fn connect(&self, credentials: &Credentials, database: Option<&str>) -> DriverResult<Self::Connection>;
}

/// An open connection to the server.
pub trait Connection {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Returns a fresh cursor bound to this connection.
    fn cursor(&self) -> DriverResult<Self::Cursor<'_>>;

    /// Commits the current transaction, if any.
    fn commit(&self) -> DriverResult<()>;

    /// Positional parameter marker understood by this driver.
    fn placeholder(&self) -> &'static str {
        "%s"
    }

    /// Closes the connection, reporting any error raised while doing so.
    fn close(self) -> DriverResult<()>
    where
        Self: Sized;
}

/// Executes statements and buffers their results.
pub trait Cursor {
    /// Executes one statement, binding `params` to its positional markers.
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<()>;

    /// Returns every remaining row of the last executed statement.
    fn fetch_all(&mut self) -> DriverResult<Vec<Row>>;

    /// Rows produced or affected by the last statement, `-1` before any.
    fn row_count(&self) -> i64;
}
