// Common test utilities for compiler integration tests

use sqlprism::{CompileResult, Compiler, MemoryCatalog};

/// Catalog shared by the integration tests
#[allow(dead_code)]
pub fn hr_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_table(
            "employees",
            [
                ("id", "int(11)"),
                ("name", "varchar(100)"),
                ("age", "int(11)"),
                ("dept_id", "int(11)"),
                ("salary", "decimal(10,2)"),
            ],
        )
        .with_table(
            "dept",
            [("id", "int(11)"), ("title", "varchar(50)"), ("site_id", "int(11)")],
        )
        .with_table("sites", [("id", "int(11)"), ("city", "text")])
        .with_table(
            "orders",
            [
                ("id", "int(11)"),
                ("status", "char(1)"),
                ("amount", "float"),
                ("customer", "varchar(100)"),
            ],
        )
}

/// Compiles `sql` against [`hr_catalog`] with the default compiler
pub fn compile(sql: &str) -> CompileResult {
    Compiler::default()
        .compile(sql, &hr_catalog())
        .expect("input within limits")
}

/// Optimized SQL text for `sql`
#[allow(dead_code)]
pub fn optimized(sql: &str) -> String {
    compile(sql)
        .optimized_sql()
        .expect("statement should parse")
}
