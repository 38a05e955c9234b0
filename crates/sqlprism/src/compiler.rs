//! Pipeline orchestration: limits, tokenizer, parser, optimizer, semantic
//! checker.

use crate::error::{Error, Result};
use crate::security::{self, ResourceLimits};
use sqlprism_core::query::{
    check, parse, tokenize, LexicalError, OptimizationStep, Optimizer, OptimizerConfig,
    SchemaHandle, SemanticError, Statement, SyntaxError, Token,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Compiler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompilerConfig {
    /// Optimizer settings
    pub optimizer: OptimizerConfig,
    /// Input size limits
    pub limits: ResourceLimits,
}

impl CompilerConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the optimizer configuration
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Enable or disable unused-column pruning
    pub fn with_column_pruning(mut self, enabled: bool) -> Self {
        self.optimizer = self.optimizer.with_column_pruning(enabled);
        self
    }

    /// Set input limits
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Outcome of one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict<E> {
    /// The stage ran and accepted the input
    Accepted,
    /// The stage ran and rejected the input
    Rejected(E),
    /// An earlier stage failed, so this one did not run
    NotRun,
}

impl<E> Verdict<E> {
    /// Returns `true` if the stage accepted the input
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Returns `true` if the stage rejected the input
    pub fn is_rejected(&self) -> bool {
        matches!(self, Verdict::Rejected(_))
    }

    /// The rejection, if any
    pub fn error(&self) -> Option<&E> {
        match self {
            Verdict::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Verdict<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected(e) => write!(f, "rejected: {}", e),
            Verdict::NotRun => write!(f, "not run"),
        }
    }
}

/// Everything produced by compiling one statement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompileResult {
    /// Tokens, empty when tokenizing failed
    pub tokens: Vec<Token>,
    /// Tokenizer verdict
    pub lexical: Verdict<LexicalError>,
    /// Parser verdict
    pub syntax: Verdict<SyntaxError>,
    /// The parsed statement, before optimization
    pub statement: Option<Statement>,
    /// The statement after all optimizer rules
    pub optimized: Option<Statement>,
    /// Optimization trace, starting with the original statement
    pub trace: Vec<OptimizationStep>,
    /// Semantic verdict on the optimized statement
    pub semantic: Verdict<SemanticError>,
}

impl CompileResult {
    fn not_run(tokens: Vec<Token>, lexical: Verdict<LexicalError>) -> Self {
        Self {
            tokens,
            lexical,
            syntax: Verdict::NotRun,
            statement: None,
            optimized: None,
            trace: Vec::new(),
            semantic: Verdict::NotRun,
        }
    }

    /// Returns `true` if every stage accepted the statement
    pub fn is_accepted(&self) -> bool {
        self.lexical.is_accepted() && self.syntax.is_accepted() && self.semantic.is_accepted()
    }

    /// The optimized statement as SQL text
    pub fn optimized_sql(&self) -> Option<String> {
        self.optimized.as_ref().map(ToString::to_string)
    }

    /// The optimized statement, only when every stage accepted it
    pub fn executable(&self) -> Option<&Statement> {
        if self.is_accepted() {
            self.optimized.as_ref()
        } else {
            None
        }
    }

    /// The first stage failure, if any
    pub fn error(&self) -> Option<Error> {
        if let Some(e) = self.lexical.error() {
            return Some(Error::Lexical(e.clone()));
        }
        if let Some(e) = self.syntax.error() {
            return Some(Error::Syntax(e.clone()));
        }
        self.semantic.error().map(|e| Error::Semantic(e.clone()))
    }

    /// Converts into the optimized statement, or the first stage failure
    pub fn into_result(self) -> Result<Statement> {
        if let Some(err) = self.error() {
            return Err(err);
        }
        self.optimized
            .ok_or_else(|| Error::InvalidInput("no statement was produced".to_string()))
    }
}

/// Runs accepted SELECT statements.
///
/// The compiler never hands raw input text or a mutating statement to an
/// engine; see [`Compiler::execute_select`].
pub trait ExecutionEngine {
    /// Result rows, in whatever shape the engine produces them
    type Rows;

    /// Executes an accepted, optimized SELECT. `sql` is its canonical text.
    fn execute_select(
        &mut self,
        sql: &str,
        select: &sqlprism_core::query::Select,
    ) -> Result<Self::Rows>;
}

/// The SQL compiler front end
///
/// Holds immutable configuration only and can be shared between threads.
///
/// # Examples
///
/// ```rust
/// use sqlprism::{Compiler, MemoryCatalog};
///
/// let catalog = MemoryCatalog::new()
///     .with_table("employees", [("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")]);
///
/// let result = Compiler::default().compile("SELECT * FROM employees WHERE 1=1 AND age > 30", &catalog)?;
/// assert!(result.is_accepted());
/// assert_eq!(
///     result.optimized_sql().as_deref(),
///     Some("SELECT id, name, age FROM employees WHERE age > 30")
/// );
/// # Ok::<(), sqlprism::Error>(())
/// ```
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    optimizer: Optimizer,
}

impl Compiler {
    /// Creates a compiler
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the configured limits are unusable
    pub fn new(config: CompilerConfig) -> Result<Self> {
        config.limits.validate()?;
        Ok(Self {
            optimizer: Optimizer::new(config.optimizer),
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles one statement
    ///
    /// Lexical and syntax failures stop the pipeline and leave the later
    /// verdicts as [`Verdict::NotRun`]. A semantic failure does not: the
    /// optimized statement and trace are still returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` only when the input exceeds the
    /// configured limits. Stage failures are reported in the result.
    pub fn compile(&self, sql: &str, schema: &dyn SchemaHandle) -> Result<CompileResult> {
        let limits = &self.config.limits;
        if let Err(e) = security::validate_query(sql, limits) {
            warn!(error = %e, "query rejected by input limits");
            return Err(e);
        }

        let tokens = match tokenize(sql) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(position = e.position, "lexical error: {}", e);
                return Ok(CompileResult::not_run(Vec::new(), Verdict::Rejected(e)));
            }
        };
        if let Err(e) = security::validate_token_count(tokens.len(), limits) {
            warn!(error = %e, "query rejected by input limits");
            return Err(e);
        }
        debug!(tokens = tokens.len(), "tokenized");

        let statement = match parse(&tokens) {
            Ok(statement) => statement,
            Err(e) => {
                warn!(position = e.position, kind = ?e.kind, "syntax error: {}", e.message);
                let mut result = CompileResult::not_run(tokens, Verdict::Accepted);
                result.syntax = Verdict::Rejected(e);
                return Ok(result);
            }
        };
        debug!(statement = statement.kind(), "parsed");

        let optimized = self.optimizer.optimize(&statement, schema);

        let semantic = match check(&optimized.statement, schema) {
            Ok(()) => Verdict::Accepted,
            Err(e) => {
                warn!("semantic error: {}", e);
                Verdict::Rejected(e)
            }
        };

        info!(
            tokens = tokens.len(),
            steps = optimized.trace.len(),
            accepted = semantic.is_accepted(),
            "compiled {}",
            statement.kind()
        );

        Ok(CompileResult {
            tokens,
            lexical: Verdict::Accepted,
            syntax: Verdict::Accepted,
            statement: Some(statement),
            optimized: Some(optimized.statement),
            trace: optimized.trace,
            semantic,
        })
    }

    /// Hands an accepted SELECT to `engine`
    ///
    /// # Errors
    ///
    /// Returns `Error::Execution` if the statement was not accepted by every
    /// stage or is not a SELECT, and passes through errors from the engine.
    pub fn execute_select<E: ExecutionEngine>(
        &self,
        result: &CompileResult,
        engine: &mut E,
    ) -> Result<E::Rows> {
        match result.executable() {
            Some(Statement::Select(select)) => {
                let sql = select.to_string();
                debug!(sql = %sql, "executing");
                engine.execute_select(&sql, select)
            }
            Some(other) => Err(Error::Execution(format!(
                "only SELECT statements can be executed, got {}",
                other.kind()
            ))),
            None => Err(Error::Execution(
                "statement was not accepted by every stage".to_string(),
            )),
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            config: CompilerConfig::default(),
            optimizer: Optimizer::default(),
        }
    }
}

/// Compiles `sql` with the default configuration
pub fn compile(sql: &str, schema: &dyn SchemaHandle) -> Result<CompileResult> {
    Compiler::default().compile(sql, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCatalog;
    use sqlprism_core::query::{SyntaxErrorKind, ORIGINAL_QUERY};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new().with_table(
            "employees",
            [("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")],
        )
    }

    #[test]
    fn test_compiler_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();
    }

    #[test]
    fn test_lexical_failure_stops_pipeline() {
        let result = compile("SELECT # FROM employees", &catalog()).unwrap();
        assert!(result.lexical.is_rejected());
        assert_eq!(result.syntax, Verdict::NotRun);
        assert_eq!(result.semantic, Verdict::NotRun);
        assert!(result.tokens.is_empty());
        assert!(result.trace.is_empty());
        assert!(matches!(result.into_result(), Err(Error::Lexical(_))));
    }

    #[test]
    fn test_syntax_failure_keeps_tokens() {
        let result = compile("SELECT name age FROM employees", &catalog()).unwrap();
        assert!(result.lexical.is_accepted());
        assert_eq!(result.tokens.len(), 5);
        let err = result.syntax.error().unwrap();
        assert_eq!(err.kind, SyntaxErrorKind::MissingComma);
        assert_eq!(err.position, 12);
        assert_eq!(result.semantic, Verdict::NotRun);
        assert!(result.optimized.is_none());
    }

    #[test]
    fn test_semantic_failure_is_not_fatal() {
        let result = compile("SELECT * FROM employees WHERE 1=1 AND salary = 1000", &catalog()).unwrap();
        assert_eq!(
            result.semantic,
            Verdict::Rejected(SemanticError::UnknownColumn("salary".into()))
        );
        assert_eq!(
            result.optimized_sql().as_deref(),
            Some("SELECT id, name, age FROM employees WHERE salary = 1000")
        );
        assert_eq!(result.trace[0].description, ORIGINAL_QUERY);
        assert!(result.executable().is_none());
    }

    #[test]
    fn test_input_limits() {
        let config = CompilerConfig::new()
            .with_limits(ResourceLimits::default().with_max_tokens(3));
        let compiler = Compiler::new(config).unwrap();
        assert!(matches!(
            compiler.compile("SELECT * FROM employees", &catalog()),
            Err(Error::InvalidInput(_))
        ));

        let invalid = CompilerConfig::new().with_limits(ResourceLimits::default().with_max_tokens(0));
        assert!(Compiler::new(invalid).is_err());
    }

    #[test]
    fn test_empty_input_is_a_syntax_error() {
        let result = compile("   ", &catalog()).unwrap();
        assert_eq!(
            result.syntax.error().map(|e| &e.kind),
            Some(&SyntaxErrorKind::EmptyStatement)
        );
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::<SemanticError>::Accepted.to_string(), "accepted");
        assert_eq!(Verdict::<SemanticError>::NotRun.to_string(), "not run");
        assert_eq!(
            Verdict::Rejected(SemanticError::UnknownTable("t".into())).to_string(),
            "rejected: Table 't' does not exist"
        );
    }
}
