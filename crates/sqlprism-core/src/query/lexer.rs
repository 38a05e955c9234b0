/// Lexer for tokenizing SQL statements
///
/// Converts raw SQL text into a stream of typed tokens for parsing.
use std::fmt;

/// Reserved words, matched case-insensitively and only as whole words.
pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE",
    "ALTER", "DROP", "TABLE", "JOIN", "INNER", "LEFT", "RIGHT", "OUTER", "ON", "AS", "GROUP", "BY",
    "HAVING", "ORDER", "ASC", "DESC",
];

/// Operators spelled as words. They are emitted as [`TokenKind::Operator`].
pub const WORD_OPERATORS: &[&str] = &["AND", "OR", "NOT", "LIKE", "IN"];

/// Token classes produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    Keyword,
    Operator,
    Punctuation,
    Identifier,
    Number,
    StringLiteral,
}

/// A single lexical token.
///
/// `text` holds the source spelling, except for keywords and word operators
/// which are normalized to upper case, and string literals which keep their
/// surrounding quotes. `position` is the character offset of the first
/// character of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Returns `true` if this is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Returns `true` if this is the given operator, symbolic or word.
    pub fn is_operator(&self, operator: &str) -> bool {
        self.kind == TokenKind::Operator && self.text.eq_ignore_ascii_case(operator)
    }

    /// Returns `true` if this is the given punctuation character.
    pub fn is_punctuation(&self, punctuation: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == 1 && self.text.starts_with(punctuation)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword => write!(f, "keyword"),
            TokenKind::Operator => write!(f, "operator"),
            TokenKind::Punctuation => write!(f, "punctuation"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::StringLiteral => write!(f, "string"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Lexer state
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token, or `None` once the input is exhausted
    pub fn next_token(&mut self) -> Result<Option<Token>, LexicalError> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(None);
        }

        let start = self.position;
        let ch = self.current_char();

        match ch {
            ',' | '(' | ')' | '*' | ';' | '.' => {
                self.advance();
                return Ok(Some(Token::new(TokenKind::Punctuation, ch, start)));
            }
            '=' => {
                self.advance();
                return Ok(Some(Token::new(TokenKind::Operator, "=", start)));
            }
            '<' => {
                self.advance();
                let text = match self.peek_current() {
                    Some('=') => "<=",
                    Some('>') => "<>",
                    _ => "<",
                };
                if text.len() == 2 {
                    self.advance();
                }
                return Ok(Some(Token::new(TokenKind::Operator, text, start)));
            }
            '>' => {
                self.advance();
                if self.peek_current() == Some('=') {
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::Operator, ">=", start)));
                }
                return Ok(Some(Token::new(TokenKind::Operator, ">", start)));
            }
            '!' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::Operator, "!=", start)));
                }
                return Err(LexicalError::new(start, ch));
            }
            '\'' => return self.read_string().map(Some),
            _ => {}
        }

        if ch.is_ascii_digit() {
            return Ok(Some(self.read_number()));
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(Some(self.read_identifier_or_keyword()));
        }

        Err(LexicalError::new(start, ch))
    }

    /// Tokenize entire input into vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexicalError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut has_dot = false;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        Token::new(TokenKind::Number, text, start)
    }

    fn read_string(&mut self) -> Result<Token, LexicalError> {
        let start = self.position;
        self.advance(); // opening quote

        while self.position < self.input.len() && self.current_char() != '\'' {
            self.advance();
        }

        // An unterminated quote matches no token class.
        if self.position >= self.input.len() {
            return Err(LexicalError::new(start, '\''));
        }

        self.advance(); // closing quote
        let text: String = self.input[start..self.position].iter().collect();

        Ok(Token::new(TokenKind::StringLiteral, text, start))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        let uppercase = text.to_ascii_uppercase();

        if KEYWORDS.contains(&uppercase.as_str()) {
            Token::new(TokenKind::Keyword, uppercase, start)
        } else if WORD_OPERATORS.contains(&uppercase.as_str()) {
            Token::new(TokenKind::Operator, uppercase, start)
        } else {
            Token::new(TokenKind::Identifier, text, start)
        }
    }
}

/// Tokenizes `input` in one call.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexicalError> {
    Lexer::new(input).tokenize()
}

/// A character that matches none of the token classes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexicalError {
    pub position: usize,
    pub character: char,
}

impl LexicalError {
    pub fn new(position: usize, character: char) -> Self {
        Self {
            position,
            character,
        }
    }
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Illegal character '{}' at position {}",
            self.character, self.position
        )
    }
}

impl std::error::Error for LexicalError {}
