mod common;

use common::compile;
use sqlprism::ast::{JoinKind, Predicate, SelectItem, Statement, TableRef};
use sqlprism::{SyntaxError, SyntaxErrorKind};

fn syntax_error(sql: &str) -> SyntaxError {
    let result = compile(sql);
    assert!(result.lexical.is_accepted(), "{} failed to tokenize", sql);
    result
        .syntax
        .error()
        .cloned()
        .unwrap_or_else(|| panic!("{} should not parse", sql))
}

fn parsed(sql: &str) -> Statement {
    compile(sql)
        .statement
        .unwrap_or_else(|| panic!("{} should parse", sql))
}

#[test]
fn test_missing_comma_position() {
    let err = syntax_error("SELECT id name, age FROM employees");
    assert_eq!(err.kind, SyntaxErrorKind::MissingComma);
    assert_eq!(err.position, 10);

    let err = syntax_error("INSERT INTO dept (id title) VALUES (1, 'Ops')");
    assert_eq!(err.kind, SyntaxErrorKind::MissingComma);
}

#[test]
fn test_required_clauses() {
    for (sql, keyword) in [
        ("SELECT id, name", "FROM"),
        ("UPDATE employees WHERE id = 1", "SET"),
        ("DELETE employees", "FROM"),
        ("INSERT dept VALUES (1)", "INTO"),
    ] {
        assert_eq!(
            syntax_error(sql).kind,
            SyntaxErrorKind::MissingClause(keyword.to_string()),
            "{}",
            sql
        );
    }
}

#[test]
fn test_parentheses() {
    let err = syntax_error("SELECT COUNT(* FROM employees");
    assert_eq!(err.kind, SyntaxErrorKind::UnbalancedParentheses);
    assert_eq!(err.position, 12);

    let err = syntax_error("SELECT id FROM employees WHERE (age > 1) AND id = 2)");
    assert_eq!(err.kind, SyntaxErrorKind::UnbalancedParentheses);
    assert_eq!(err.position, 51);
}

#[test]
fn test_grouping_errors() {
    assert_eq!(
        syntax_error("SELECT dept_id FROM employees GROUP BY 'x'").kind,
        SyntaxErrorKind::InvalidGroupByColumn
    );
    assert_eq!(
        syntax_error("SELECT dept_id FROM employees WHERE age > 3 HAVING COUNT(*) > 1").kind,
        SyntaxErrorKind::HavingWithoutGroupBy
    );
}

#[test]
fn test_unsupported_and_empty() {
    assert_eq!(syntax_error("").kind, SyntaxErrorKind::EmptyStatement);
    assert_eq!(syntax_error(" ; ").kind, SyntaxErrorKind::UnsupportedStatement);
    assert_eq!(
        syntax_error("ALTER TABLE dept").kind,
        SyntaxErrorKind::UnsupportedStatement
    );
    assert_eq!(
        syntax_error("LEFT JOIN dept d ON d.id = e.dept_id").kind,
        SyntaxErrorKind::JoinOutsideSelect
    );
}

#[test]
fn test_truncated_input_reports_end() {
    let sql = "SELECT id FROM employees ORDER BY";
    let err = syntax_error(sql);
    assert_eq!(err.kind, SyntaxErrorKind::UnexpectedEnd);
    assert_eq!(err.position, sql.len());
}

#[test]
fn test_deep_nesting_is_rejected() {
    let sql = format!(
        "SELECT id FROM employees WHERE {}age > 30{}",
        "(".repeat(30_000),
        ")".repeat(30_000)
    );
    let result = compile(&sql);
    let err = result.syntax.error().expect("syntax error");
    assert_eq!(err.kind, SyntaxErrorKind::NestingTooDeep);
    assert!(result.statement.is_none());

    assert!(compile("SELECT id FROM employees WHERE ((((age > 30))))").is_accepted());
}

#[test]
fn test_join_kinds() {
    let statement = parsed(
        "SELECT e.id FROM employees e INNER JOIN dept d ON d.id = e.dept_id \
         LEFT OUTER JOIN sites s ON s.id = d.site_id RIGHT JOIN orders o ON o.id = e.id",
    );
    let Statement::Select(select) = statement else {
        panic!("expected SELECT");
    };
    let kinds: Vec<JoinKind> = select.joins.iter().map(|j| j.kind).collect();
    assert_eq!(kinds, vec![JoinKind::Inner, JoinKind::Left, JoinKind::Right]);
    assert_eq!(select.joins[1].binding(), "s");
}

#[test]
fn test_derived_table_and_aggregates() {
    let statement = parsed(
        "SELECT t.dept_id, MAX(t.age) AS oldest FROM (SELECT * FROM employees WHERE age > 18) AS t \
         GROUP BY t.dept_id HAVING MAX(t.age) < 70",
    );
    let Statement::Select(select) = statement else {
        panic!("expected SELECT");
    };
    assert!(matches!(select.from, TableRef::Derived { ref alias, .. } if alias == "t"));
    assert!(matches!(
        select.columns[1],
        SelectItem::Aggregate { alias: Some(ref a), .. } if a == "oldest"
    ));
    assert_eq!(select.group_by.len(), 1);
    assert!(select.having.is_some());
}

#[test]
fn test_condition_grouping() {
    let statement = parsed(
        "SELECT id FROM orders WHERE status = 'A' OR status = 'B' AND amount > 3 AND NOT customer LIKE 'x%'",
    );
    let Statement::Select(select) = statement else {
        panic!("expected SELECT");
    };
    // AND binds the OR group on its left
    let Some(Predicate::And(conjuncts)) = select.where_clause else {
        panic!("expected AND");
    };
    assert_eq!(conjuncts.len(), 3);
    assert!(matches!(conjuncts[0], Predicate::Or(ref alternatives) if alternatives.len() == 2));
    assert!(matches!(conjuncts[2], Predicate::Not(_)));
}

#[test]
fn test_case_insensitive_keywords() {
    assert_eq!(
        compile("select Name from Employees where AGE >= 21 order by name desc;")
            .optimized_sql()
            .as_deref(),
        Some("SELECT Name FROM Employees WHERE AGE >= 21 ORDER BY name DESC")
    );
}
