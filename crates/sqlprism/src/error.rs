//! Error types for the SQLPrism API.

use sqlprism_core::query::{LexicalError, SemanticError, SyntaxError};
use std::fmt;

/// The main error type for SQLPrism operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input rejected before compilation (size limits, bad configuration)
    InvalidInput(String),

    /// Tokenizer failure
    Lexical(LexicalError),

    /// Parser failure
    Syntax(SyntaxError),

    /// Unknown table or column, or incompatible literal
    Semantic(SemanticError),

    /// Execution refused or failed
    Execution(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Lexical(e) => write!(f, "Lexical error: {}", e),
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Semantic(e) => write!(f, "Semantic error: {}", e),
            Error::Execution(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Lexical(e) => Some(e),
            Error::Syntax(e) => Some(e),
            Error::Semantic(e) => Some(e),
            _ => None,
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

impl From<sqlprism_core::Error> for Error {
    fn from(err: sqlprism_core::Error) -> Self {
        match err {
            sqlprism_core::Error::Lexical(e) => Error::Lexical(e),
            sqlprism_core::Error::Syntax(e) => Error::Syntax(e),
            sqlprism_core::Error::Semantic(e) => Error::Semantic(e),
        }
    }
}

/// A specialized `Result` type for SQLPrism operations.
pub type Result<T> = std::result::Result<T, Error>;
