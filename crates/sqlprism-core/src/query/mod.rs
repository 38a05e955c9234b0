//! SQL front end
//!
//! Tokenizing, parsing, semantic checking and rule-based optimization.

/// Abstract Syntax Tree types
#[allow(missing_docs)]
pub mod ast;
/// SQL lexer
#[allow(missing_docs)]
pub mod lexer;
/// Rule-based optimizer
#[allow(missing_docs)]
pub mod optimizer;
/// SQL parser
#[allow(missing_docs)]
pub mod parser;
/// Schema lookups
#[allow(missing_docs)]
pub mod schema;
/// Semantic checker
#[allow(missing_docs)]
pub mod semantic;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use ast::*;
pub use lexer::{tokenize, LexicalError, Lexer, Token, TokenKind};
pub use optimizer::{
    OptimizationStep, Optimized, Optimizer, OptimizerConfig, Rule, ORIGINAL_QUERY,
};
pub use parser::{parse, Parser, SyntaxError, SyntaxErrorKind};
pub use schema::{SchemaHandle, TypeFamily};
pub use semantic::{check, SemanticError};

/// Tokenizes and parses a single statement.
pub fn parse_sql(input: &str) -> crate::Result<Statement> {
    let tokens = tokenize(input)?;
    Ok(parse(&tokens)?)
}
