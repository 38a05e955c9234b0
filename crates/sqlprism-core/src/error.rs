//! Error types for SQLPrism.

use crate::query::{LexicalError, SemanticError, SyntaxError};
use std::fmt;

/// Failures of the individual front-end stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Character the tokenizer could not classify
    Lexical(LexicalError),

    /// Malformed statement structure
    Syntax(SyntaxError),

    /// Statement refers to unknown tables or columns, or mixes types
    Semantic(SemanticError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lexical(e) => write!(f, "Lexical error: {}", e),
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Semantic(e) => write!(f, "Semantic error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Lexical(e) => Some(e),
            Error::Syntax(e) => Some(e),
            Error::Semantic(e) => Some(e),
        }
    }
}

impl From<LexicalError> for Error {
    fn from(err: LexicalError) -> Self {
        Error::Lexical(err)
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<SemanticError> for Error {
    fn from(err: SemanticError) -> Self {
        Error::Semantic(err)
    }
}

/// A specialized `Result` type for SQLPrism front-end operations.
pub type Result<T> = std::result::Result<T, Error>;
