/// Query Assembly Module
///
/// Builds the SQL text for every client operation. Nothing here talks to a
/// driver, so each statement can be checked as plain text.
///
/// Identifiers, update values and WHERE conditions are interpolated into the
/// statement verbatim; callers must sanitize them. Only INSERT values go
/// through parameter binding.

/// Server-level statement listing every database.
pub const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Statement listing every table in the selected database.
pub const SHOW_TABLES: &str = "SHOW TABLES";

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", name)
}

pub fn drop_database(name: &str) -> String {
    format!("DROP DATABASE {}", name)
}

pub fn use_database(name: &str) -> String {
    format!("USE {}", name)
}

pub fn create_table(table: &str, column_definitions: &str) -> String {
    format!("CREATE TABLE {} ({})", table, column_definitions)
}

pub fn clear_table(table: &str) -> String {
    format!("DELETE FROM {}", table)
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {}", table)
}

pub fn explain_table(table: &str) -> String {
    format!("EXPLAIN {}", table)
}

/// INSERT with one positional marker per column.
pub fn insert(table: &str, column_count: usize, placeholder: &str) -> String {
    let markers = vec![placeholder; column_count].join(",");
    format!("INSERT INTO {} VALUES ({})", table, markers)
}

/// UPDATE of a single column. An empty condition updates every row.
pub fn update(table: &str, column: &str, value: &str, condition: &str) -> String {
    join_fragments(&[
        format!("UPDATE {} SET {}='{}'", table, column, value),
        where_clause(condition),
    ])
}

/// DELETE with a WHERE clause that is always emitted, even when
/// `conditions` is empty (which leaves the statement malformed).
pub fn delete(table: &str, conditions: &str) -> String {
    format!("DELETE FROM {} WHERE {}", table, conditions)
}

/// `SELECT * FROM <table> [ORDER BY ..] [LIMIT n] [OFFSET n]`
pub fn select_all<K, V>(table: &str, sort_by: &[(K, V)], limit: Option<u64>, offset: Option<u64>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    join_fragments(&[
        format!("SELECT * FROM {}", table),
        order_by(sort_by),
        limit_clause(limit),
        offset_clause(offset),
    ])
}

/// `SELECT <cols|*> FROM <table> [WHERE ..] [LIMIT n] [OFFSET n]`
pub fn select_filtered<S: AsRef<str>>(
    table: &str,
    cols: &[S],
    conditions: &str,
    limit: Option<u64>,
    offset: Option<u64>,
) -> String {
    let columns = if cols.is_empty() {
        "*".to_string()
    } else {
        cols.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
    };

    join_fragments(&[
        format!("SELECT {} FROM {}", columns, table),
        where_clause(conditions),
        limit_clause(limit),
        offset_clause(offset),
    ])
}

/// ORDER BY fragment. Only the last usable `(column, direction)` pair is
/// kept; earlier pairs are overwritten, not combined. A pair with a
/// direction but no column renders the direction as a quoted literal.
pub fn order_by<K, V>(sort_by: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut clause = String::new();
    for (key, direction) in sort_by {
        let (key, direction) = (key.as_ref(), direction.as_ref());
        if direction.is_empty() {
            continue;
        }
        clause = if key.is_empty() {
            format!("ORDER BY {} '{}'", key, direction)
        } else {
            format!("ORDER BY {} {}", key, direction)
        };
    }
    clause
}

fn where_clause(conditions: &str) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions)
    }
}

// Zero is treated like an absent bound.
fn limit_clause(limit: Option<u64>) -> String {
    match limit {
        Some(n) if n > 0 => format!("LIMIT {}", n),
        _ => String::new(),
    }
}

fn offset_clause(offset: Option<u64>) -> String {
    match offset {
        Some(n) if n > 0 => format!("OFFSET {}", n),
        _ => String::new(),
    }
}

fn join_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .filter(|f| !f.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
