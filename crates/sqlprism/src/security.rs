/// Input limits for the compiler
///
/// Bounds the size of accepted SQL text and of its token stream before any
/// parsing work is done.
use crate::error::{Error, Result};

/// Default maximum SQL text length in bytes (1 MB)
pub const MAX_QUERY_LENGTH: usize = 1024 * 1024;

/// Default maximum number of tokens per statement
pub const MAX_TOKENS: usize = 100_000;

/// Resource limits applied to every compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimits {
    /// Maximum SQL text length in bytes
    pub max_query_length: usize,
    /// Maximum number of tokens
    pub max_tokens: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_query_length: MAX_QUERY_LENGTH,
            max_tokens: MAX_TOKENS,
        }
    }
}

impl ResourceLimits {
    /// Set the maximum SQL text length
    pub fn with_max_query_length(mut self, length: usize) -> Self {
        self.max_query_length = length;
        self
    }

    /// Set the maximum token count
    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Validates that the limits themselves are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_query_length == 0 {
            return Err(Error::InvalidInput(
                "max_query_length cannot be zero".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(Error::InvalidInput("max_tokens cannot be zero".to_string()));
        }

        Ok(())
    }
}

/// Validates SQL text against the limits
///
/// # Errors
///
/// Returns `Error::InvalidInput` if:
/// - The text is longer than `max_query_length` bytes
/// - The text contains a NUL character
///
/// Empty text is allowed here; the parser reports it as an empty statement.
pub fn validate_query(query: &str, limits: &ResourceLimits) -> Result<()> {
    if query.len() > limits.max_query_length {
        return Err(Error::InvalidInput(format!(
            "Query length {} exceeds maximum {}",
            query.len(),
            limits.max_query_length
        )));
    }

    if query.contains('\0') {
        return Err(Error::InvalidInput(
            "Query cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}

/// Validates the token count of a tokenized query
///
/// # Errors
///
/// Returns `Error::InvalidInput` if `count` exceeds `max_tokens`
pub fn validate_token_count(count: usize, limits: &ResourceLimits) -> Result<()> {
    if count > limits.max_tokens {
        return Err(Error::InvalidInput(format!(
            "Token count {} exceeds maximum {}",
            count, limits.max_tokens
        )));
    }

    Ok(())
}
