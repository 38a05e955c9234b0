//! In-memory schema catalog.

use sqlprism_core::query::SchemaHandle;
use std::collections::HashMap;

/// A table definition: name plus `(column, type)` pairs in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableSchema {
    /// Table name as declared
    pub name: String,
    /// Columns with their declared types, e.g. `("age", "int(11)")`
    pub columns: Vec<(String, String)>,
}

impl TableSchema {
    /// Creates a table definition
    pub fn new<N, C, T>(name: N, columns: impl IntoIterator<Item = (C, T)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|(c, t)| (c.into(), t.into()))
                .collect(),
        }
    }
}

/// A [`SchemaHandle`] backed by a map of table definitions.
///
/// Table and column lookups ignore ASCII case. Type names are free-form; the
/// semantic checker classifies them by prefix (`int`, `decimal`, `varchar`, ...).
///
/// # Examples
///
/// ```rust
/// use sqlprism::{MemoryCatalog, SchemaHandle};
///
/// let catalog = MemoryCatalog::new()
///     .with_table("employees", [("id", "int(11)"), ("name", "varchar(100)")]);
///
/// assert!(catalog.exists("EMPLOYEES"));
/// assert_eq!(catalog.columns_of("employees"), vec!["id", "name"]);
/// assert_eq!(catalog.type_of("employees", "Name").as_deref(), Some("varchar(100)"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryCatalog {
    tables: HashMap<String, TableSchema>,
}

impl MemoryCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table and returns the catalog, for chaining
    pub fn with_table<N, C, T>(mut self, name: N, columns: impl IntoIterator<Item = (C, T)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        T: Into<String>,
    {
        self.add_table(TableSchema::new(name, columns));
        self
    }

    /// Adds or replaces a table definition
    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
    }

    /// Removes a table, returning its definition
    pub fn remove_table(&mut self, name: &str) -> Option<TableSchema> {
        self.tables.remove(&name.to_ascii_lowercase())
    }

    /// Looks up a table definition
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// Declared table names, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.values().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if the catalog has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl SchemaHandle for MemoryCatalog {
    fn exists(&self, table: &str) -> bool {
        self.table(table).is_some()
    }

    fn columns_of(&self, table: &str) -> Vec<String> {
        self.table(table)
            .map(|t| t.columns.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default()
    }

    fn type_of(&self, table: &str, column: &str) -> Option<String> {
        self.table(table)?
            .columns
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, t)| t.clone())
    }
}
