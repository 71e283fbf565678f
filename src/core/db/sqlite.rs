/// SQLite Driver Module
///
/// A `Driver` backed by rusqlite. A "server" is a directory and each of its
/// `<name>.db` files is a database, so the client can run without an
/// external server process.
///
/// SQLite has no notion of SHOW DATABASES, USE and friends. The handful of
/// server-level statements the client issues are recognized here and
/// emulated on top of the file system and SQLite's own catalog; every other
/// statement goes to SQLite unchanged.

use crate::core::db::driver::{Connection, Credentials, Cursor, Driver};
use crate::core::db::value::{Row, Value};
use crate::core::{DriverError, DriverResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::OpenFlags;
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATABASE_EXTENSION: &str = "db";

static SHOW_DATABASES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^SHOW\s+DATABASES$").unwrap());
static SHOW_TABLES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^SHOW\s+TABLES$").unwrap());
static CREATE_DATABASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CREATE\s+DATABASE\s+(\w+)$").unwrap());
static DROP_DATABASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^DROP\s+DATABASE\s+(\w+)$").unwrap());
static USE_DATABASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^USE\s+(\w+)$").unwrap());
static EXPLAIN_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^EXPLAIN\s+(\w+)$").unwrap());

/// Server-level statements emulated by this driver
#[derive(Debug, Clone, PartialEq)]
enum Command {
    ShowDatabases,
    CreateDatabase(String),
    DropDatabase(String),
    Use(String),
    ShowTables,
    Explain(String),
    /// Anything else, handed to SQLite as-is
    Sql,
}

impl Command {
    fn classify(sql: &str) -> Self {
        if SHOW_DATABASES.is_match(sql) {
            Command::ShowDatabases
        } else if SHOW_TABLES.is_match(sql) {
            Command::ShowTables
        } else if let Some(name) = capture(&CREATE_DATABASE, sql) {
            Command::CreateDatabase(name)
        } else if let Some(name) = capture(&DROP_DATABASE, sql) {
            Command::DropDatabase(name)
        } else if let Some(name) = capture(&USE_DATABASE, sql) {
            Command::Use(name)
        } else if let Some(table) = capture(&EXPLAIN_TABLE, sql) {
            Command::Explain(table)
        } else {
            Command::Sql
        }
    }
}

fn capture(re: &Regex, sql: &str) -> Option<String> {
    re.captures(sql).map(|c| c[1].to_string())
}

/// Strips surrounding whitespace and trailing statement terminators.
fn normalize(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Driver treating a directory as a database server
#[derive(Clone, Default)]
pub struct SqliteDriver {
    /// `(user, password)` every connection must present, if any
    required_login: Option<(String, String)>,
}

impl SqliteDriver {
    /// Creates a driver that accepts any user and password
    pub fn new() -> Self {
        SqliteDriver::default()
    }

    /// Creates a driver that refuses connections not presenting this login
    pub fn with_credentials(user: impl Into<String>, password: impl Into<String>) -> Self {
        SqliteDriver {
            required_login: Some((user.into(), password.into())),
        }
    }

    fn authenticate(&self, credentials: &Credentials) -> DriverResult<()> {
        match &self.required_login {
            Some((user, password)) if *user != credentials.user || *password != credentials.password => {
                Err(DriverError::AccessDenied(credentials.user.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field(
                "required_login",
                &self.required_login.as_ref().map(|(user, _)| (user, "<redacted>")),
            )
            .finish()
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self, credentials: &Credentials, database: Option<&str>) -> DriverResult<SqliteConnection> {
        let root = PathBuf::from(&credentials.host);
        if !root.is_dir() {
            return Err(DriverError::Unreachable(credentials.host.clone()));
        }
        self.authenticate(credentials)?;

        let (conn, database) = match database {
            Some(name) => (open_database(&root, name)?, Some(name.to_lowercase())),
            None => (rusqlite::Connection::open_in_memory()?, None),
        };
        debug!("Opened SQLite connection under {:?} (database: {:?})", root, database);

        Ok(SqliteConnection {
            root,
            conn: RefCell::new(conn),
            database: RefCell::new(database),
        })
    }
}

fn database_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.{}", name.to_lowercase(), DATABASE_EXTENSION))
}

fn open_database(root: &Path, name: &str) -> DriverResult<rusqlite::Connection> {
    let path = database_path(root, name);
    if !path.is_file() {
        return Err(DriverError::UnknownDatabase(name.to_string()));
    }
    Ok(rusqlite::Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// Connection to the directory "server", optionally bound to one database
#[derive(Debug)]
pub struct SqliteConnection {
    root: PathBuf,
    conn: RefCell<rusqlite::Connection>,
    database: RefCell<Option<String>>,
}

impl SqliteConnection {
    /// Name of the database this connection currently points at
    pub fn database(&self) -> Option<String> {
        self.database.borrow().clone()
    }

    fn run(&self, sql: &str, params: &[Value]) -> DriverResult<(Vec<Row>, i64)> {
        match Command::classify(sql) {
            Command::ShowDatabases => {
                let rows = self.list_databases()?;
                let count = rows.len() as i64;
                Ok((rows, count))
            }
            Command::CreateDatabase(name) => {
                let path = database_path(&self.root, &name);
                fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .map_err(|e| match e.kind() {
                        std::io::ErrorKind::AlreadyExists => DriverError::DatabaseExists(name.clone()),
                        _ => DriverError::Io(e),
                    })?;
                Ok((Vec::new(), 1))
            }
            Command::DropDatabase(name) => {
                let path = database_path(&self.root, &name);
                if !path.is_file() {
                    return Err(DriverError::UnknownDatabase(name));
                }
                fs::remove_file(path)?;
                Ok((Vec::new(), 0))
            }
            Command::Use(name) => {
                let conn = open_database(&self.root, &name)?;
                *self.conn.borrow_mut() = conn;
                *self.database.borrow_mut() = Some(name.to_lowercase());
                Ok((Vec::new(), 0))
            }
            Command::ShowTables => {
                self.require_database()?;
                self.query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                    &[],
                )
            }
            Command::Explain(table) => self.explain(&table),
            Command::Sql => self.query(sql, params),
        }
    }

    fn require_database(&self) -> DriverResult<()> {
        match *self.database.borrow() {
            Some(_) => Ok(()),
            None => Err(DriverError::NoDatabaseSelected),
        }
    }

    fn list_databases(&self) -> DriverResult<Vec<Row>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(DATABASE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names.into_iter().map(|name| vec![Value::Text(name)]).collect())
    }

    /// Rows shaped like a MySQL column description:
    /// `Field, Type, Null, Key, Default, Extra`
    fn explain(&self, table: &str) -> DriverResult<(Vec<Row>, i64)> {
        self.require_database()?;
        let (info, _) = self.query(&format!("PRAGMA table_info('{}')", table), &[])?;
        if info.is_empty() {
            return Err(DriverError::Other(format!("Table '{}' doesn't exist", table)));
        }

        let rows: Vec<Row> = info
            .into_iter()
            .map(|col| {
                let mut fields = col.into_iter().skip(1);
                let name = fields.next().unwrap_or(Value::Null);
                let type_name = fields.next().unwrap_or(Value::Null);
                let notnull = fields.next().and_then(|v| v.as_i64()).unwrap_or(0) != 0;
                let default = fields.next().unwrap_or(Value::Null);
                let pk = fields.next().and_then(|v| v.as_i64()).unwrap_or(0) != 0;
                vec![
                    name,
                    type_name,
                    Value::from(if notnull || pk { "NO" } else { "YES" }),
                    Value::from(if pk { "PRI" } else { "" }),
                    default,
                    Value::from(""),
                ]
            })
            .collect();
        let count = rows.len() as i64;
        Ok((rows, count))
    }

    fn query(&self, sql: &str, params: &[Value]) -> DriverResult<(Vec<Row>, i64)> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(sql)?;
        let bound = rusqlite::params_from_iter(params.iter().map(to_sqlite));

        let column_count = stmt.column_count();
        if column_count == 0 {
            let changed = stmt.execute(bound)?;
            return Ok((Vec::new(), changed as i64));
        }

        let mut rows = Vec::new();
        let mut result = stmt.query(bound)?;
        while let Some(row) = result.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(from_sqlite(row.get_ref(i)?));
            }
            rows.push(values);
        }
        let count = rows.len() as i64;
        Ok((rows, count))
    }
}

impl Connection for SqliteConnection {
    type Cursor<'a> = SqliteCursor<'a>;

    fn cursor(&self) -> DriverResult<SqliteCursor<'_>> {
        Ok(SqliteCursor {
            connection: self,
            rows: Vec::new(),
            row_count: -1,
        })
    }

    fn commit(&self) -> DriverResult<()> {
        let conn = self.conn.borrow();
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn close(self) -> DriverResult<()> {
        self.conn.into_inner().close().map_err(|(_, e)| DriverError::Sqlite(e))
    }
}

/// Cursor buffering the full result of its last statement
pub struct SqliteCursor<'a> {
    connection: &'a SqliteConnection,
    rows: Vec<Row>,
    row_count: i64,
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<()> {
        let sql = normalize(sql);
        debug!("Executing: {}", sql);
        let (rows, row_count) = self.connection.run(sql, params)?;
        self.rows = rows;
        self.row_count = row_count;
        Ok(())
    }

    fn fetch_all(&mut self) -> DriverResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Integer(i) => SqliteValue::Integer(*i),
        Value::Real(f) => SqliteValue::Real(*f),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Blob(b) => SqliteValue::Blob(b.clone()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
