mod common;

use common::{compile, hr_catalog};
use sqlprism::{check, parse, tokenize, MemoryCatalog, SemanticError, TableSchema};

fn semantic(sql: &str) -> Result<(), SemanticError> {
    match compile(sql).semantic.error() {
        Some(e) => Err(e.clone()),
        None => Ok(()),
    }
}

#[test]
fn test_unknown_column_salary() {
    let catalog = MemoryCatalog::new().with_table(
        "employees",
        [("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")],
    );
    let statement = parse(&tokenize("SELECT * FROM employees WHERE salary = 1000").unwrap()).unwrap();
    assert_eq!(
        check(&statement, &catalog),
        Err(SemanticError::UnknownColumn("salary".into()))
    );

    // the shared catalog has it
    assert!(semantic("SELECT * FROM employees WHERE salary = 1000").is_ok());
}

#[test]
fn test_unknown_tables() {
    assert_eq!(
        semantic("SELECT * FROM payroll"),
        Err(SemanticError::UnknownTable("payroll".into()))
    );
    assert_eq!(
        semantic("DELETE FROM payroll WHERE id = 1"),
        Err(SemanticError::UnknownTable("payroll".into()))
    );
    assert_eq!(
        semantic("DROP TABLE payroll"),
        Err(SemanticError::UnknownTable("payroll".into()))
    );
    assert_eq!(
        semantic("SELECT e.name, p.id FROM employees e LEFT JOIN payroll p ON p.id = e.id"),
        Err(SemanticError::UnknownTable("payroll".into()))
    );
}

#[test]
fn test_join_columns_resolve_through_aliases() {
    assert!(semantic(
        "SELECT e.name, d.title, s.city FROM employees e \
         JOIN dept d ON d.id = e.dept_id JOIN sites s ON s.id = d.site_id \
         WHERE s.city = 'Oslo' ORDER BY e.name"
    )
    .is_ok());
    assert_eq!(
        semantic("SELECT e.name, d.city FROM employees e JOIN dept d ON d.id = e.dept_id"),
        Err(SemanticError::UnknownColumn("d.city".into()))
    );
    assert_eq!(
        semantic("SELECT e.name, d.title FROM employees e JOIN dept d ON d.id = e.manager"),
        Err(SemanticError::UnknownColumn("e.manager".into()))
    );
}

#[test]
fn test_literal_types() {
    assert!(semantic("SELECT id FROM orders WHERE status = 'A' AND amount = 9.5").is_ok());
    assert!(semantic("SELECT id FROM orders WHERE customer LIKE 'Ann%'").is_ok());
    assert_eq!(
        semantic("SELECT id FROM orders WHERE amount = 'lots'"),
        Err(SemanticError::TypeMismatch {
            column: "amount".into(),
            column_type: "float".into(),
            literal: "'lots'".into(),
        })
    );
    assert!(matches!(
        semantic("SELECT id FROM orders WHERE status IN ('A', 7)"),
        Err(SemanticError::TypeMismatch { .. })
    ));
    assert!(matches!(
        semantic("UPDATE employees SET age = 'old' WHERE id = 1"),
        Err(SemanticError::TypeMismatch { .. })
    ));
    assert!(matches!(
        semantic("INSERT INTO dept (id, title) VALUES ('x', 'Ops')"),
        Err(SemanticError::TypeMismatch { .. })
    ));
}

#[test]
fn test_type_family_uses_base_type_name() {
    let catalog = MemoryCatalog::new().with_table(
        "shifts",
        [("id", "integer"), ("pause", "interval"), ("label", "character varying(20)")],
    );
    let check_sql = |sql: &str| check(&parse(&tokenize(sql).unwrap()).unwrap(), &catalog);

    assert!(check_sql("SELECT id FROM shifts WHERE id = 3 AND label = 'night'").is_ok());
    assert_eq!(
        check_sql("SELECT id FROM shifts WHERE pause = 15"),
        Err(SemanticError::TypeMismatch {
            column: "pause".into(),
            column_type: "interval".into(),
            literal: "15".into(),
        })
    );
}

#[test]
fn test_mismatch_message() {
    let err = semantic("SELECT id FROM employees WHERE age = 'old'").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Type mismatch: column 'age' of type int(11) is incompatible with 'old'"
    );
}

#[test]
fn test_grouping_and_aliases() {
    assert!(semantic(
        "SELECT dept_id, COUNT(*) AS headcount, AVG(age) FROM employees \
         GROUP BY dept_id HAVING headcount > 3 ORDER BY headcount DESC"
    )
    .is_ok());
    assert_eq!(
        semantic("SELECT dept_id, SUM(bonus) FROM employees GROUP BY dept_id"),
        Err(SemanticError::UnknownColumn("bonus".into()))
    );
    assert_eq!(
        semantic("SELECT dept_id FROM employees GROUP BY team"),
        Err(SemanticError::UnknownColumn("team".into()))
    );
}

#[test]
fn test_checked_after_optimization() {
    // star expansion makes the projection explicit before checking
    let result = compile("SELECT * FROM (SELECT * FROM employees WHERE age > 30) e WHERE e.dept_id = 2");
    assert!(result.is_accepted());
    assert_eq!(
        result.optimized_sql().as_deref(),
        Some("SELECT id, name, age, dept_id, salary FROM employees e WHERE e.age > 30 AND e.dept_id = 2")
    );
}

#[test]
fn test_catalog_changes_are_seen() {
    let mut catalog = hr_catalog();
    let statement = parse(&tokenize("SELECT code FROM regions").unwrap()).unwrap();
    assert!(check(&statement, &catalog).is_err());

    catalog.add_table(TableSchema::new("regions", [("code", "char(2)")]));
    assert!(check(&statement, &catalog).is_ok());
}
