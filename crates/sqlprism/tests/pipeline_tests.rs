mod common;

use common::{compile, hr_catalog};
use sqlprism::ast::Select;
use sqlprism::{
    Compiler, CompilerConfig, Error, ExecutionEngine, ResourceLimits, Result, SemanticError,
    SyntaxErrorKind, TokenKind, Verdict, ORIGINAL_QUERY,
};

/// Records what it was asked to run
#[derive(Default)]
struct RecordingEngine {
    executed: Vec<String>,
}

impl ExecutionEngine for RecordingEngine {
    type Rows = usize;

    fn execute_select(&mut self, sql: &str, select: &Select) -> Result<usize> {
        self.executed.push(sql.to_string());
        Ok(select.columns.len())
    }
}

#[test]
fn test_accepted_select_has_every_artifact() {
    let result = compile("SELECT name FROM employees WHERE age > 30 AND age > 25");

    assert!(result.is_accepted());
    assert_eq!(result.lexical, Verdict::Accepted);
    assert_eq!(result.syntax, Verdict::Accepted);
    assert_eq!(result.semantic, Verdict::Accepted);
    assert_eq!(result.tokens.len(), 12);
    assert_eq!(result.trace.len(), 2);
    assert_eq!(result.trace[0].description, ORIGINAL_QUERY);
    assert_eq!(
        result.trace[0].statement,
        "SELECT name FROM employees WHERE age > 30 AND age > 25"
    );
    assert!(result.error().is_none());
    assert_eq!(
        result.into_result().unwrap().to_string(),
        "SELECT name FROM employees WHERE age > 30"
    );
}

#[test]
fn test_tokens_keep_positions_and_kinds() {
    let result = compile("select e.name from employees e where e.name like 'A%'");
    let kinds: Vec<TokenKind> = result.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Punctuation,
            TokenKind::Identifier,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Punctuation,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::StringLiteral,
        ]
    );
    assert_eq!(result.tokens[0].text, "SELECT");
    assert_eq!(result.tokens[11].text, "LIKE");
    assert_eq!(result.tokens[12].text, "'A%'");
    assert_eq!(result.tokens[12].position, 49);
}

#[test]
fn test_lexical_rejection() {
    let result = compile("SELECT name FROM employees WHERE age > 30 @");
    let err = result.lexical.error().expect("lexical error");
    assert_eq!(err.character, '@');
    assert_eq!(err.position, 42);
    assert_eq!(result.syntax, Verdict::NotRun);
    assert_eq!(result.semantic, Verdict::NotRun);
    assert!(result.optimized_sql().is_none());

    let message = result.error().unwrap().to_string();
    assert!(message.contains("Illegal character '@' at position 42"), "{}", message);
}

#[test]
fn test_syntax_rejection() {
    let result = compile("SELECT name FROM employees WHERE (age > 30");
    assert!(result.lexical.is_accepted());
    assert!(!result.tokens.is_empty());
    let err = result.syntax.error().expect("syntax error");
    assert_eq!(err.kind, SyntaxErrorKind::UnbalancedParentheses);
    assert_eq!(err.position, 33);
    assert!(result.statement.is_none());
    assert!(result.trace.is_empty());
    assert_eq!(result.semantic, Verdict::NotRun);
    assert!(matches!(result.into_result(), Err(Error::Syntax(_))));
}

#[test]
fn test_semantic_rejection_still_optimizes() {
    let result = compile("SELECT name FROM employees WHERE 1=1 AND bonus > 5");
    assert_eq!(
        result.semantic,
        Verdict::Rejected(SemanticError::UnknownColumn("bonus".into()))
    );
    assert_eq!(
        result.optimized_sql().as_deref(),
        Some("SELECT name FROM employees WHERE bonus > 5")
    );
    assert_eq!(result.trace.len(), 2);
    assert!(!result.is_accepted());
    assert!(result.executable().is_none());
}

#[test]
fn test_execution_is_gated() {
    let compiler = Compiler::default();
    let catalog = hr_catalog();
    let mut engine = RecordingEngine::default();

    let accepted = compiler
        .compile("SELECT * FROM dept WHERE 1=1", &catalog)
        .unwrap();
    assert_eq!(compiler.execute_select(&accepted, &mut engine).unwrap(), 3);
    assert_eq!(engine.executed, vec!["SELECT id, title, site_id FROM dept"]);

    for sql in [
        "DELETE FROM dept WHERE id = 1",
        "SELECT * FROM payroll",
        "SELECT * FROM dept WHERE",
        "SELECT ? FROM dept",
    ] {
        let result = compiler.compile(sql, &catalog).unwrap();
        assert!(
            matches!(compiler.execute_select(&result, &mut engine), Err(Error::Execution(_))),
            "{} should not execute",
            sql
        );
    }
    assert_eq!(engine.executed.len(), 1);
}

#[test]
fn test_every_statement_kind_compiles() {
    for (sql, kind) in [
        ("SELECT id FROM dept", "SELECT"),
        ("INSERT INTO dept (id, title) VALUES (1, 'Ops'), (2, 'Dev')", "INSERT"),
        ("UPDATE employees SET age = 31, name = 'Ann' WHERE id = 7", "UPDATE"),
        ("DELETE FROM orders WHERE status IN ('X', 'Y')", "DELETE"),
        ("DROP TABLE sites;", "DROP"),
    ] {
        let result = compile(sql);
        assert!(result.is_accepted(), "{}: {:?}", sql, result.error());
        assert_eq!(result.statement.as_ref().map(|s| s.kind()), Some(kind));
    }
}

#[test]
fn test_input_limits_are_errors() {
    let limits = ResourceLimits::default().with_max_query_length(16);
    let compiler = Compiler::new(CompilerConfig::new().with_limits(limits)).unwrap();
    let catalog = hr_catalog();

    assert!(compiler.compile("SELECT id FROM t", &catalog).is_ok());
    assert!(matches!(
        compiler.compile("SELECT id FROM dept", &catalog),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        compiler.compile("SELECT\0", &catalog),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_compiler_shared_between_threads() {
    let compiler = std::sync::Arc::new(Compiler::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let compiler = compiler.clone();
            std::thread::spawn(move || {
                let sql = format!("SELECT name FROM employees WHERE id = {}", i);
                compiler
                    .compile(&sql, &hr_catalog())
                    .map(|r| r.is_accepted())
                    .unwrap_or(false)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
