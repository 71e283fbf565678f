/// Database Client Module
///
/// `DatabaseClient` holds two connections obtained from a `Driver`:
/// - a server-scope connection, opened on construction, for listing,
///   creating, dropping and selecting databases
/// - a database-scope connection, opened by `select_database`, for every
///   table and record operation
///
/// Each operation assembles one SQL statement (see `core::db::query`) and
/// runs it on a fresh cursor. Driver failures are converted into the
/// matching `EzsqlError` at the call boundary; a failed call leaves the
/// client usable.
///
/// ## Usage constraint
///
/// The client is meant for one thread at a time. Connections and cursors
/// are not synchronized; `DatabaseClient<SqliteDriver>` is not `Sync`.
///
/// ## Injection surface
///
/// Table and column names, `update_record` values and every WHERE condition
/// are interpolated into the SQL text verbatim. Only `insert_record` binds
/// its values as parameters. Callers must sanitize the rest.

use crate::config::ServerConfig;
use crate::core::db::{query, Connection, Credentials, Cursor, Driver, Row, TableSchema, Value};
use crate::core::{DriverResult, EzsqlError, Result};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// The database picked by `select_database`, with its own connection
struct ActiveDatabase<C> {
    /// Lowercased database name
    name: String,
    conn: C,
}

/// Convenience client for database, table and record operations
pub struct DatabaseClient<D: Driver> {
    driver: D,
    credentials: Credentials,
    server: D::Connection,
    active: Option<ActiveDatabase<D::Connection>>,
}

impl<D: Driver> DatabaseClient<D> {
    /// Connects to the server.
    ///
    /// # Errors
    ///
    /// Returns `EzsqlError::ServerConnection` for any connection failure
    /// (authentication, unreachable host, ...).
    pub fn connect(driver: D, credentials: Credentials) -> Result<Self> {
        let server = driver.connect(&credentials, None).map_err(|e| {
            warn!("Connection to {} failed: {}", credentials.host, e);
            EzsqlError::server_connection()
        })?;
        info!("Connected to database server");

        Ok(DatabaseClient {
            driver,
            credentials,
            server,
            active: None,
        })
    }

    /// Connects using `config`, then selects its database if one is named.
    pub fn from_config(driver: D, config: &ServerConfig) -> Result<Self> {
        let mut client = DatabaseClient::connect(driver, Credentials::from(config))?;
        if let Some(database) = &config.database {
            client.select_database(database)?;
        }
        Ok(client)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Lowercased name of the selected database
    pub fn current_database(&self) -> Option<&str> {
        self.active.as_ref().map(|db| db.name.as_str())
    }

    // Database operations

    /// Names of every database on the server, lowercased.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let rows = fetch(&self.server, query::SHOW_DATABASES)?;
        Ok(first_fields(rows).map(|name| name.to_lowercase()).collect())
    }

    /// Case-insensitive membership check against `list_databases`.
    pub fn database_exists(&self, name: &str) -> Result<bool> {
        let exists = self.list_databases()?.contains(&name.to_lowercase());
        if exists {
            info!("Database exists: {}", name);
        } else {
            info!("Database does not exists: {}", name);
        }
        Ok(exists)
    }

    /// Creates a database.
    ///
    /// The statement is always attempted first; only once it has failed is
    /// the server asked whether the database already exists, to pick the
    /// error message.
    pub fn create_database(&self, name: &str) -> Result<()> {
        match execute(&self.server, &query::create_database(name), &[]) {
            Ok(_) => {
                info!("Database Created: {}", name);
                Ok(())
            }
            Err(e) => {
                warn!("Creating database {} failed: {}", name, e);
                if matches!(self.database_exists(name), Ok(true)) {
                    Err(EzsqlError::DatabaseCreate("Database already exists".to_string()))
                } else {
                    Err(EzsqlError::database_create())
                }
            }
        }
    }

    /// Drops a database. Failures are classified after the fact, like
    /// `create_database`.
    pub fn drop_database(&self, name: &str) -> Result<()> {
        match execute(&self.server, &query::drop_database(name), &[]) {
            Ok(_) => {
                info!("Database dropped: {}", name);
                Ok(())
            }
            Err(e) => {
                warn!("Dropping database {} failed: {}", name, e);
                if matches!(self.database_exists(name), Ok(false)) {
                    Err(EzsqlError::DatabaseDrop("Database does not exist".to_string()))
                } else {
                    Err(EzsqlError::database_drop())
                }
            }
        }
    }

    /// Opens a connection scoped to `name` and makes it the active
    /// database. A previously selected database is closed.
    ///
    /// # Errors
    ///
    /// Returns `EzsqlError::DatabaseSelection` if the connection or the
    /// `USE` on the server connection fails. The previous selection stays
    /// in place in that case.
    pub fn select_database(&mut self, name: &str) -> Result<()> {
        let lowered = name.to_lowercase();
        let conn = self
            .driver
            .connect(&self.credentials, Some(lowered.as_str()))
            .map_err(|e| {
                warn!("Selecting database {} failed: {}", name, e);
                EzsqlError::database_selection()
            })?;
        execute(&self.server, &query::use_database(name), &[]).map_err(|e| {
            warn!("USE {} failed: {}", name, e);
            EzsqlError::database_selection()
        })?;

        info!("Database Selected: {}.", lowered);
        let previous = self.active.replace(ActiveDatabase { name: lowered, conn });
        if let Some(previous) = previous {
            if let Err(e) = previous.conn.close() {
                warn!("Closing connection to {} failed: {}", previous.name, e);
            }
        }
        Ok(())
    }

    // Table operations

    /// Tables of the selected database, names as reported by the server.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let db = self.active()?;
        let rows = fetch(&db.conn, query::SHOW_TABLES)?;
        Ok(first_fields(rows).collect())
    }

    /// Case-sensitive membership check against `list_tables`.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_tables()?.iter().any(|table| table == name))
    }

    /// Creates a table from ordered `(column, type)` pairs.
    ///
    /// `primary_key`, when non-empty, must name one of the columns
    /// (case-insensitively); that column gets `PRIMARY KEY` appended to its
    /// type.
    ///
    /// # Errors
    ///
    /// Returns `EzsqlError::TableCreate` if the table exists, `columns` is
    /// empty, the primary key matches no column, or the statement fails.
    pub fn create_table<K, V>(&self, name: &str, columns: &[(K, V)], primary_key: &str) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let db = self.active()?;
        if self.table_exists(name)? {
            return Err(EzsqlError::TableCreate(format!("Table '{}' already exists.", name)));
        }
        let definitions = TableSchema::new(columns, primary_key).column_definitions()?;

        execute(&db.conn, &query::create_table(name, &definitions), &[]).map_err(|e| {
            warn!("Creating table {} failed: {}", name, e);
            EzsqlError::table_create()
        })?;
        info!("Table Created: {}", name);
        Ok(())
    }

    /// Deletes every row of `name`.
    pub fn clear_table(&self, name: &str) -> Result<()> {
        let conn = self.require_table(name)?;
        execute(conn, &query::clear_table(name), &[])
            .and_then(|_| conn.commit())
            .map_err(|e| {
                warn!("Clearing table {} failed: {}", name, e);
                EzsqlError::TableAccess("Error when deleting table records.".to_string())
            })?;
        info!("Table Cleared: {}", name);
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        let conn = self.require_table(name)?;
        execute(conn, &query::drop_table(name), &[]).map_err(|e| {
            warn!("Dropping table {} failed: {}", name, e);
            EzsqlError::TableAccess("Error when deleting table.".to_string())
        })?;
        info!("Table Deleted: {}", name);
        Ok(())
    }

    /// Column names of `name` in server-reported order.
    pub fn describe_columns(&self, name: &str) -> Result<Vec<String>> {
        let conn = self.require_table(name)?;
        let rows = fetch(conn, &query::explain_table(name))?;
        Ok(first_fields(rows).collect())
    }

    // Record operations

    /// Inserts one row, binding `values` positionally.
    ///
    /// The statement carries one marker per column of the table; `values`
    /// is not checked against it, so a count or type mismatch surfaces as
    /// the driver's error.
    pub fn insert_record(&self, table: &str, values: &[Value]) -> Result<()> {
        let conn = self.require_table(table)?;
        let columns = self.describe_columns(table)?;
        let sql = query::insert(table, columns.len(), conn.placeholder());

        execute(conn, &sql, values)
            .and_then(|_| conn.commit())
            .map_err(|e| {
                warn!("Inserting into {} failed: {}", table, e);
                match e.to_string() {
                    msg if msg.is_empty() => EzsqlError::record_adding(),
                    msg => EzsqlError::RecordAdding(msg),
                }
            })?;
        info!("New Record added into: {}", table);
        Ok(())
    }

    /// Sets `column` to `value` on the rows matching `condition` and
    /// returns the affected row count.
    ///
    /// WARNING: an empty `condition` updates every row of the table.
    pub fn update_record(&self, table: &str, column: &str, value: impl Display, condition: &str) -> Result<u64> {
        let conn = self.require_table(table)?;
        let sql = query::update(table, column, &value.to_string(), condition);

        let affected = execute(conn, &sql, &[])
            .and_then(|count| conn.commit().map(|_| count))
            .map_err(|e| {
                warn!("Updating {} failed: {}", table, e);
                EzsqlError::TableAccess(e.to_string())
            })?;
        info!("{} row(s) affected.", affected);
        Ok(affected.max(0) as u64)
    }

    /// Every row of `table`.
    ///
    /// Only the last `(column, direction)` pair of `sort_by` is applied.
    /// `limit`/`offset` of zero are ignored.
    pub fn select_all<K, V>(
        &self,
        table: &str,
        sort_by: &[(K, V)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Row>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let conn = self.require_table(table)?;
        fetch(conn, &query::select_all(table, sort_by, limit, offset)).map_err(|e| {
            warn!("Selecting from {} failed: {}", table, e);
            EzsqlError::table_access()
        })
    }

    /// Rows of `table` matching a raw WHERE `conditions` string, restricted
    /// to `cols` (all columns when empty).
    pub fn select_filtered<S: AsRef<str>>(
        &self,
        table: &str,
        cols: &[S],
        conditions: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Row>> {
        let conn = self.require_table(table)?;
        fetch(conn, &query::select_filtered(table, cols, conditions, limit, offset)).map_err(|e| {
            warn!("Selecting from {} failed: {}", table, e);
            EzsqlError::table_access()
        })
    }

    /// Deletes the rows matching `conditions` and returns how many went.
    ///
    /// The WHERE keyword is always emitted, so an empty `conditions` yields
    /// a malformed statement and an error rather than an emptied table.
    pub fn delete_records(&self, table: &str, conditions: &str) -> Result<u64> {
        let conn = self.require_table(table)?;
        let deleted = execute(conn, &query::delete(table, conditions), &[])
            .and_then(|count| conn.commit().map(|_| count))
            .map_err(|e| {
                warn!("Deleting from {} failed: {}", table, e);
                EzsqlError::TableAccess("Error when Deleting the record".to_string())
            })?;
        info!("{} Record(s) Deleted.", deleted);
        Ok(deleted.max(0) as u64)
    }

    /// Closes the database connection, then the server connection.
    ///
    /// Both are closed even if the first fails; the first error is returned.
    pub fn close(self) -> Result<()> {
        let database_result = match self.active {
            Some(db) => db.conn.close(),
            None => Ok(()),
        };
        let server_result = self.server.close();
        database_result.and(server_result)?;
        debug!("Client closed");
        Ok(())
    }

    fn active(&self) -> Result<&ActiveDatabase<D::Connection>> {
        self.active
            .as_ref()
            .ok_or_else(|| EzsqlError::DatabaseSelection("No database selected.".to_string()))
    }

    /// The database connection, once `table` is known to exist.
    fn require_table(&self, table: &str) -> Result<&D::Connection> {
        let db = self.active()?;
        if !self.table_exists(table)? {
            return Err(EzsqlError::table_not_found());
        }
        Ok(&db.conn)
    }
}

/// Runs a statement that returns rows.
fn fetch<C: Connection>(conn: &C, sql: &str) -> DriverResult<Vec<Row>> {
    let mut cursor = conn.cursor()?;
    debug!("Executing: {}", sql);
    cursor.execute(sql, &[])?;
    cursor.fetch_all()
}

/// Runs a statement and returns the driver's row count.
fn execute<C: Connection>(conn: &C, sql: &str, params: &[Value]) -> DriverResult<i64> {
    let mut cursor = conn.cursor()?;
    debug!("Executing: {} ({} parameters)", sql, params.len());
    cursor.execute(sql, params)?;
    Ok(cursor.row_count())
}

/// The first field of each row as text.
fn first_fields(rows: Vec<Row>) -> impl Iterator<Item = String> {
    rows.into_iter().filter_map(|row| match row.into_iter().next() {
        Some(Value::Text(s)) => Some(s),
        Some(Value::Blob(b)) => Some(String::from_utf8_lossy(&b).into_owned()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}
