/// # Test Utilities Module
///
/// A scripted, in-process stand-in for a database server. `FakeDriver`
/// answers the listing statements the client relies on from canned state,
/// records every statement it is handed together with the connection scope
/// and bound parameters, and fails on demand.
///
/// Connections share one `FakeServer` through `Rc<RefCell<..>>`, so a test
/// keeps a handle to the driver and inspects the log after each call.

use crate::core::db::{Connection, Credentials, Cursor, Driver, Row, Value};
use crate::core::{DriverError, DriverResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Which connection a statement went through
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Server,
    Database(String),
}

/// One statement as the driver received it
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub scope: Scope,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Canned server state plus everything the driver observed
#[derive(Debug, Default)]
pub struct FakeServer {
    /// Answer to SHOW DATABASES, as stored by the server
    pub databases: Vec<String>,
    /// Answer to SHOW TABLES
    pub tables: Vec<String>,
    /// Answer to EXPLAIN, keyed by table
    pub columns: HashMap<String, Vec<String>>,
    /// Answer to any SELECT
    pub rows: Vec<Row>,
    /// Row count reported for statements without a result set
    pub affected: i64,
    /// Statements containing any of these fragments fail
    pub fail_matching: Vec<String>,
    /// Simulated failures carry an empty message
    pub silent_failures: bool,
    /// Refuse every connection attempt
    pub refuse_connect: bool,
    /// Refuse database-scoped connection attempts
    pub refuse_database: bool,
    pub log: Vec<Executed>,
    pub commits: Vec<Scope>,
    pub closed: Vec<Scope>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    pub server: Rc<RefCell<FakeServer>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        FakeDriver::default()
    }

    /// A driver whose server already holds `databases`, with `tables`
    /// (and their columns) in whichever database gets selected.
    pub fn with_state(databases: &[&str], tables: &[(&str, &[&str])]) -> Self {
        let driver = FakeDriver::new();
        {
            let mut server = driver.server.borrow_mut();
            server.databases = databases.iter().map(|d| d.to_string()).collect();
            for (table, columns) in tables {
                server.tables.push(table.to_string());
                server
                    .columns
                    .insert(table.to_string(), columns.iter().map(|c| c.to_string()).collect());
            }
        }
        driver
    }

    pub fn fail_on(&self, fragment: &str) {
        self.server.borrow_mut().fail_matching.push(fragment.to_string());
    }

    /// SQL of every executed statement, in order
    pub fn statements(&self) -> Vec<String> {
        self.server.borrow().log.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.server.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.server.borrow_mut().log.clear();
    }

    pub fn commits(&self) -> usize {
        self.server.borrow().commits.len()
    }
}

impl Driver for FakeDriver {
    type Connection = FakeConnection;

    fn connect(&self, credentials: &Credentials, database: Option<&str>) -> DriverResult<FakeConnection> {
        let server = self.server.borrow();
        if server.refuse_connect {
            return Err(DriverError::Unreachable(credentials.host.clone()));
        }
        let scope = match database {
            Some(name) if server.refuse_database => {
                return Err(DriverError::UnknownDatabase(name.to_string()))
            }
            Some(name) => Scope::Database(name.to_string()),
            None => Scope::Server,
        };
        Ok(FakeConnection {
            server: Rc::clone(&self.server),
            scope,
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    server: Rc<RefCell<FakeServer>>,
    scope: Scope,
}

impl Connection for FakeConnection {
    type Cursor<'a> = FakeCursor<'a>;

    fn cursor(&self) -> DriverResult<FakeCursor<'_>> {
        Ok(FakeCursor {
            connection: self,
            rows: Vec::new(),
            row_count: -1,
        })
    }

    fn commit(&self) -> DriverResult<()> {
        self.server.borrow_mut().commits.push(self.scope.clone());
        Ok(())
    }

    fn close(self) -> DriverResult<()> {
        self.server.borrow_mut().closed.push(self.scope);
        Ok(())
    }
}

pub struct FakeCursor<'a> {
    connection: &'a FakeConnection,
    rows: Vec<Row>,
    row_count: i64,
}

impl Cursor for FakeCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<()> {
        let mut server = self.connection.server.borrow_mut();
        server.log.push(Executed {
            scope: self.connection.scope.clone(),
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if let Some(fragment) = server.fail_matching.iter().find(|f| sql.contains(f.as_str())) {
            if server.silent_failures {
                return Err(DriverError::Other(String::new()));
            }
            return Err(DriverError::Other(format!("simulated failure on '{}'", fragment)));
        }
        if sql.ends_with("WHERE ") {
            return Err(DriverError::Other(
                "You have an error in your SQL syntax near ''".to_string(),
            ));
        }

        self.rows = if sql == "SHOW DATABASES" {
            text_rows(&server.databases)
        } else if sql == "SHOW TABLES" {
            text_rows(&server.tables)
        } else if let Some(table) = sql.strip_prefix("EXPLAIN ") {
            server
                .columns
                .get(table)
                .map(|cols| {
                    cols.iter()
                        .map(|c| vec![Value::Text(c.clone()), Value::from("VARCHAR(20)")])
                        .collect()
                })
                .unwrap_or_default()
        } else if sql.starts_with("SELECT") {
            server.rows.clone()
        } else {
            self.row_count = server.affected;
            return Ok(());
        };
        self.row_count = self.rows.len() as i64;
        Ok(())
    }

    fn fetch_all(&mut self) -> DriverResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }
}

fn text_rows(items: &[String]) -> Vec<Row> {
    items.iter().map(|i| vec![Value::Text(i.clone())]).collect()
}

pub fn credentials() -> Credentials {
    Credentials::new("localhost", "root", "secret")
}
