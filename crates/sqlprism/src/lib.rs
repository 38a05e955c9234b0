//! # SQLPrism
//!
//! The front end of a miniature SQL compiler. SQLPrism turns SQL text into
//! validated, optimized SQL plus the artifacts of every stage: tokens, a
//! syntax verdict, an optimization trace and a semantic verdict.
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlprism::{Compiler, MemoryCatalog};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = MemoryCatalog::new()
//!         .with_table("employees", [("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")]);
//!
//!     let compiler = Compiler::default();
//!     let result = compiler.compile(
//!         "SELECT name FROM employees WHERE age > 30 AND age > 25",
//!         &catalog,
//!     )?;
//!
//!     for step in &result.trace {
//!         println!("{}: {}", step.description, step.statement);
//!     }
//!     assert_eq!(
//!         result.optimized_sql().as_deref(),
//!         Some("SELECT name FROM employees WHERE age > 30")
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. Input limits ([`ResourceLimits`])
//! 2. Tokenizer: illegal characters stop the pipeline
//! 3. Parser: structural errors stop the pipeline
//! 4. Optimizer: ordered rewrite rules, each recorded in the trace when it
//!    changes the statement
//! 5. Semantic checker: runs on the optimized statement; a failure is
//!    reported but the optimized text is still returned
//!
//! Schema information comes from a caller-provided [`SchemaHandle`].
//! [`MemoryCatalog`] is a ready-made in-memory implementation.
//!
//! ## Executing
//!
//! Only statements accepted by every stage can be executed, and only SELECTs.
//!
//! ```rust
//! use sqlprism::{Compiler, ExecutionEngine, MemoryCatalog, Result};
//! use sqlprism::ast::Select;
//!
//! struct Echo;
//!
//! impl ExecutionEngine for Echo {
//!     type Rows = Vec<String>;
//!
//!     fn execute_select(&mut self, sql: &str, _select: &Select) -> Result<Vec<String>> {
//!         Ok(vec![sql.to_string()])
//!     }
//! }
//!
//! let catalog = MemoryCatalog::new().with_table("t", [("id", "int")]);
//! let compiler = Compiler::default();
//!
//! let result = compiler.compile("SELECT id FROM t", &catalog)?;
//! assert_eq!(compiler.execute_select(&result, &mut Echo)?, vec!["SELECT id FROM t"]);
//!
//! let result = compiler.compile("DELETE FROM t", &catalog)?;
//! assert!(compiler.execute_select(&result, &mut Echo).is_err());
//! # Ok::<(), sqlprism::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod catalog;
mod compiler;
mod error;

/// Logging configuration
pub mod logging;
/// Input limits
pub mod security;

pub use catalog::{MemoryCatalog, TableSchema};
pub use compiler::{compile, CompileResult, Compiler, CompilerConfig, ExecutionEngine, Verdict};
pub use error::{Error, Result};
pub use security::ResourceLimits;

// Re-export core types
pub use sqlprism_core::query::ast;
pub use sqlprism_core::query::optimizer;
pub use sqlprism_core::query::{
    check, parse, tokenize, LexicalError, OptimizationStep, Optimized, Optimizer,
    OptimizerConfig, Rule, SchemaHandle, SemanticError, Statement, SyntaxError, SyntaxErrorKind,
    Token, TokenKind, TypeFamily, ORIGINAL_QUERY,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
