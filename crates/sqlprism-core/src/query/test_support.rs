//! Shared fixtures for unit tests.

use super::ast::Statement;
use super::lexer::tokenize;
use super::parser::parse;
use super::schema::SchemaHandle;

/// Fixed catalog: `employees`, `dept` and `staff`.
pub(crate) struct TestSchema;

impl TestSchema {
    fn table(name: &str) -> Option<&'static [(&'static str, &'static str)]> {
        match name.to_ascii_lowercase().as_str() {
            "employees" => Some(&[
                ("id", "int(11)"),
                ("name", "varchar(100)"),
                ("age", "int(11)"),
                ("dept_id", "int(11)"),
                ("hired", "date"),
            ]),
            "dept" => Some(&[("id", "int(11)"), ("title", "varchar(50)")]),
            "staff" => Some(&[("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")]),
            _ => None,
        }
    }
}

impl SchemaHandle for TestSchema {
    fn exists(&self, table: &str) -> bool {
        Self::table(table).is_some()
    }

    fn columns_of(&self, table: &str) -> Vec<String> {
        Self::table(table)
            .map(|cols| cols.iter().map(|(c, _)| c.to_string()).collect())
            .unwrap_or_default()
    }

    fn type_of(&self, table: &str, column: &str) -> Option<String> {
        Self::table(table)?
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, t)| t.to_string())
    }
}

/// Tokenizes and parses `sql`, panicking on failure.
pub(crate) fn parse_sql(sql: &str) -> Statement {
    let tokens = tokenize(sql).unwrap();
    parse(&tokens).unwrap()
}
