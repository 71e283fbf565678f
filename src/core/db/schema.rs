/// Table Schema Module
///
/// Describes the columns of a table about to be created and renders the
/// column-definition clause of its CREATE TABLE statement. A schema is
/// transient: it is not retained once the table exists.

use crate::core::{EzsqlError, Result};

/// A single column declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// SQL type declaration (e.g., "INT", "VARCHAR(20)")
    pub type_decl: String,
}

/// Ordered column declarations plus an optional primary key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    /// Primary key column name; empty when the table has none
    pub primary_key: String,
}

impl TableSchema {
    /// Builds a schema from `(name, type)` pairs, keeping their order
    pub fn new<K, V>(columns: &[(K, V)], primary_key: &str) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        TableSchema {
            columns: columns
                .iter()
                .map(|(name, type_decl)| ColumnDef {
                    name: name.as_ref().to_string(),
                    type_decl: type_decl.as_ref().to_string(),
                })
                .collect(),
            primary_key: primary_key.to_string(),
        }
    }

    /// Renders `"<col> <type>,<col> <type>..."`, appending `PRIMARY KEY` to
    /// the type of the column whose name matches the primary key
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `EzsqlError::TableCreate` if there are no columns, or if a
    /// primary key is named but matches none of them.
    pub fn column_definitions(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(EzsqlError::TableCreate("At least one column required.".to_string()));
        }

        let mut primary_key_set = false;
        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                if self.is_primary_key(&col.name) {
                    primary_key_set = true;
                    format!("{} {} PRIMARY KEY", col.name, col.type_decl)
                } else {
                    format!("{} {}", col.name, col.type_decl)
                }
            })
            .collect();

        if !self.primary_key.is_empty() && !primary_key_set {
            return Err(EzsqlError::TableCreate(format!(
                "Invalid primary key: {}",
                self.primary_key
            )));
        }

        Ok(definitions.join(","))
    }

    fn is_primary_key(&self, column: &str) -> bool {
        !self.primary_key.is_empty() && column.to_lowercase() == self.primary_key.to_lowercase()
    }
}
