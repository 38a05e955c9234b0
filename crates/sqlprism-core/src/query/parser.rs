/// Parser for SQL statements
///
/// Validates the structure of a token stream and converts it into an
/// Abstract Syntax Tree (AST). Three structural passes run over the raw
/// tokens before any node is built: required clauses, parenthesis balance
/// and missing commas between adjacent identifiers.
use super::ast::*;
use super::lexer::{Token, TokenKind};
use std::fmt;

/// Keywords that may start a join clause
const JOIN_STARTS: &[&str] = &["JOIN", "INNER", "LEFT", "RIGHT"];

/// Keywords after which `name alias` is a legal identifier pair
const ALIAS_CONTEXTS: &[&str] = &["FROM", "JOIN", "UPDATE", "INTO"];

/// Deepest nesting of parentheses, `NOT` and derived tables accepted
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parses a complete statement from a token stream.
pub fn parse(tokens: &[Token]) -> Result<Statement, SyntaxError> {
    Parser::new(tokens).parse()
}

/// Parser state over a borrowed token stream
pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse the token stream into a statement
    pub fn parse(&mut self) -> Result<Statement, SyntaxError> {
        let first = match self.tokens.first() {
            Some(token) => token,
            None => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::EmptyStatement,
                    0,
                    "Empty statement",
                ))
            }
        };

        let leading = if first.kind == TokenKind::Keyword {
            first.text.as_str()
        } else {
            ""
        };
        match leading {
            "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "DROP" => {}
            kw if JOIN_STARTS.contains(&kw) => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::JoinOutsideSelect,
                    first.position,
                    "JOIN is only valid inside a SELECT statement",
                ));
            }
            _ => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnsupportedStatement,
                    first.position,
                    format!("Unsupported statement starting with '{}'", first.text),
                ));
            }
        }

        self.check_required_clauses(leading)?;
        self.check_parentheses()?;
        self.check_missing_commas()?;

        let statement = match leading {
            "SELECT" => Statement::Select(self.parse_select()?),
            "INSERT" => Statement::Insert(self.parse_insert()?),
            "UPDATE" => Statement::Update(self.parse_update()?),
            "DELETE" => Statement::Delete(self.parse_delete()?),
            _ => Statement::Drop(self.parse_drop()?),
        };

        if self.check_punctuation(';') {
            self.advance();
        }
        if let Some(token) = self.current_token() {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                token.position,
                format!("Unexpected '{}' after end of statement", token.text),
            ));
        }

        Ok(statement)
    }

    // Structural passes

    fn check_required_clauses(&self, leading: &str) -> Result<(), SyntaxError> {
        let required: &[&str] = match leading {
            "SELECT" => &["FROM"],
            "INSERT" => &["INTO", "VALUES"],
            "DELETE" => &["FROM"],
            "UPDATE" => &["SET"],
            "DROP" => &["TABLE"],
            _ => &[],
        };

        for keyword in required {
            if !self.tokens.iter().any(|t| t.is_keyword(keyword)) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::MissingClause(keyword.to_string()),
                    self.end_position(),
                    format!("{} statement requires {}", leading, keyword),
                ));
            }
        }
        Ok(())
    }

    fn check_parentheses(&self) -> Result<(), SyntaxError> {
        let mut open = Vec::new();
        for token in self.tokens {
            if token.is_punctuation('(') {
                open.push(token.position);
            } else if token.is_punctuation(')') && open.pop().is_none() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnbalancedParentheses,
                    token.position,
                    format!("Unmatched ')' at position {}", token.position),
                ));
            }
        }
        if let Some(position) = open.pop() {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnbalancedParentheses,
                position,
                format!("Unclosed '(' at position {}", position),
            ));
        }
        Ok(())
    }

    fn check_missing_commas(&self) -> Result<(), SyntaxError> {
        // (index of first token, is identifier) per unit, with `a . b` collapsed
        let mut units: Vec<(usize, bool)> = Vec::with_capacity(self.tokens.len());
        let mut i = 0;
        while i < self.tokens.len() {
            let start = i;
            if self.tokens[i].is_identifier() {
                while i + 2 < self.tokens.len()
                    && self.tokens[i + 1].is_punctuation('.')
                    && self.tokens[i + 2].is_identifier()
                {
                    i += 2;
                }
                units.push((start, true));
            } else {
                units.push((start, false));
            }
            i += 1;
        }

        for pair in units.windows(2) {
            let (first, first_is_ident) = pair[0];
            let (second, second_is_ident) = pair[1];
            if !(first_is_ident && second_is_ident) {
                continue;
            }
            let alias_pair = first > 0
                && ALIAS_CONTEXTS
                    .iter()
                    .any(|kw| self.tokens[first - 1].is_keyword(kw));
            if !alias_pair {
                let token = &self.tokens[second];
                return Err(SyntaxError::new(
                    SyntaxErrorKind::MissingComma,
                    token.position,
                    format!(
                        "Missing comma before '{}' at position {}",
                        token.text, token.position
                    ),
                ));
            }
        }
        Ok(())
    }

    // Statements

    fn parse_select(&mut self) -> Result<Select, SyntaxError> {
        self.expect_keyword("SELECT")?;
        let columns = self.parse_select_list()?;

        self.expect_keyword("FROM")?;
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        while self.at_join() {
            joins.push(self.parse_join()?);
        }

        let where_clause = if self.check_keyword("WHERE") {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        let group_by = self.parse_group_by()?;

        let having = if self.check_keyword("HAVING") {
            if group_by.is_empty() {
                let position = self.position_of_current();
                return Err(SyntaxError::new(
                    SyntaxErrorKind::HavingWithoutGroupBy,
                    position,
                    "HAVING requires GROUP BY",
                ));
            }
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        let order_by = self.parse_order_by()?;

        Ok(Select {
            columns,
            from,
            joins,
            where_clause,
            group_by,
            having,
            order_by,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>, SyntaxError> {
        let mut columns = Vec::new();

        loop {
            if self.check_punctuation('*') {
                self.advance();
                columns.push(SelectItem::Wildcard);
            } else if self.at_function_call() {
                let (function, argument) = self.parse_aggregate()?;
                let alias = self.parse_column_alias()?;
                columns.push(SelectItem::Aggregate {
                    function,
                    argument,
                    alias,
                });
            } else {
                let name = self.parse_qualified_name("column name or *")?;
                let alias = self.parse_column_alias()?;
                columns.push(SelectItem::Column { name, alias });
            }

            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }

        Ok(columns)
    }

    fn parse_column_alias(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.check_keyword("AS") {
            self.advance();
            Ok(Some(self.expect_identifier("alias")?))
        } else {
            Ok(None)
        }
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, SyntaxError> {
        if self.check_punctuation('(') {
            self.advance();
            let query = self.nested(Self::parse_select)?;
            self.expect_punctuation(')')?;
            if self.check_keyword("AS") {
                self.advance();
            }
            let alias = self.expect_identifier("derived table alias")?;
            return Ok(TableRef::Derived {
                query: Box::new(query),
                alias,
            });
        }

        let name = self.expect_identifier("table name")?;
        let alias = self.parse_table_alias()?;
        Ok(TableRef::Table { name, alias })
    }

    fn parse_table_alias(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.check_keyword("AS") {
            self.advance();
            return Ok(Some(self.expect_identifier("alias")?));
        }
        match self.current_token() {
            Some(token) if token.is_identifier() => {
                let alias = token.text.clone();
                self.advance();
                Ok(Some(alias))
            }
            _ => Ok(None),
        }
    }

    fn parse_join(&mut self) -> Result<JoinClause, SyntaxError> {
        let kind = if self.check_keyword("INNER") {
            self.advance();
            JoinKind::Inner
        } else if self.check_keyword("LEFT") || self.check_keyword("RIGHT") {
            let kind = if self.check_keyword("LEFT") {
                JoinKind::Left
            } else {
                JoinKind::Right
            };
            self.advance();
            if self.check_keyword("OUTER") {
                self.advance();
            }
            kind
        } else {
            JoinKind::Inner
        };
        self.expect_keyword("JOIN")?;

        let table = self.expect_identifier("table name")?;
        let alias = self.parse_table_alias()?;

        self.expect_keyword("ON")?;
        let on_left = self.parse_qualified_name("join column")?;
        self.expect_operator("=")?;
        let on_right = self.parse_qualified_name("join column")?;

        Ok(JoinClause {
            kind,
            table,
            alias,
            on_left,
            on_right,
        })
    }

    fn parse_group_by(&mut self) -> Result<Vec<QualifiedName>, SyntaxError> {
        if !self.check_keyword("GROUP") {
            return Ok(Vec::new());
        }
        self.advance();
        self.expect_keyword("BY")?;

        let mut columns = Vec::new();
        loop {
            match self.current_token() {
                Some(token) if token.is_identifier() => {
                    columns.push(self.parse_qualified_name("column name")?);
                }
                Some(token) => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidGroupByColumn,
                        token.position,
                        format!("Invalid GROUP BY column '{}'", token.text),
                    ));
                }
                None => return Err(self.unexpected("GROUP BY column")),
            }

            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(columns)
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderByItem>, SyntaxError> {
        if !self.check_keyword("ORDER") {
            return Ok(Vec::new());
        }
        self.advance();
        self.expect_keyword("BY")?;

        let mut items = Vec::new();
        loop {
            let column = self.parse_qualified_name("ORDER BY column")?;
            let direction = if self.check_keyword("ASC") {
                self.advance();
                Some(OrderDirection::Asc)
            } else if self.check_keyword("DESC") {
                self.advance();
                Some(OrderDirection::Desc)
            } else {
                None
            };
            items.push(OrderByItem { column, direction });

            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_insert(&mut self) -> Result<Insert, SyntaxError> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.expect_identifier("table name")?;

        let mut columns = Vec::new();
        if self.check_punctuation('(') {
            self.advance();
            loop {
                columns.push(self.expect_identifier("column name")?);
                if self.check_punctuation(',') {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_punctuation(')')?;
        }

        self.expect_keyword("VALUES")?;
        let mut values = Vec::new();
        loop {
            self.expect_punctuation('(')?;
            let mut row = Vec::new();
            loop {
                row.push(self.parse_literal()?);
                if self.check_punctuation(',') {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_punctuation(')')?;
            values.push(row);

            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }

        Ok(Insert {
            table,
            columns,
            values,
        })
    }

    fn parse_update(&mut self) -> Result<Update, SyntaxError> {
        self.expect_keyword("UPDATE")?;
        let table = self.expect_identifier("table name")?;
        let alias = self.parse_table_alias()?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier("column name")?;
            self.expect_operator("=")?;
            let value = self.parse_operand()?;
            assignments.push(Assignment { column, value });

            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }

        let where_clause = if self.check_keyword("WHERE") {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(Update {
            table,
            alias,
            assignments,
            where_clause,
        })
    }

    fn parse_delete(&mut self) -> Result<Delete, SyntaxError> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.expect_identifier("table name")?;

        let where_clause = if self.check_keyword("WHERE") {
            self.advance();
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(Delete {
            table,
            where_clause,
        })
    }

    fn parse_drop(&mut self) -> Result<Drop, SyntaxError> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let table = self.expect_identifier("table name")?;
        Ok(Drop { table })
    }

    // Conditions: an AND-list of OR-groups

    fn parse_condition(&mut self) -> Result<Predicate, SyntaxError> {
        let mut conjuncts = vec![self.parse_or_group()?];
        while self.check_operator("AND") {
            self.advance();
            conjuncts.push(self.parse_or_group()?);
        }
        Ok(Predicate::and(conjuncts))
    }

    fn parse_or_group(&mut self) -> Result<Predicate, SyntaxError> {
        let mut alternatives = vec![self.parse_not()?];
        while self.check_operator("OR") {
            self.advance();
            alternatives.push(self.parse_not()?);
        }
        Ok(Predicate::or(alternatives))
    }

    fn parse_not(&mut self) -> Result<Predicate, SyntaxError> {
        if self.check_operator("NOT") {
            self.advance();
            let inner = self.nested(Self::parse_not)?;
            return Ok(Predicate::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Predicate, SyntaxError> {
        if self.check_punctuation('(') {
            self.advance();
            let inner = self.nested(Self::parse_condition)?;
            self.expect_punctuation(')')?;
            return Ok(inner);
        }

        let operand_position = self.position_of_current();
        let left = self.parse_operand()?;

        // column [NOT] IN (v1, v2, ...)
        let negated = self.check_operator("NOT") && self.peek_is_operator(1, "IN");
        if negated || self.check_operator("IN") {
            let column = match left {
                Operand::Column(name) => name,
                _ => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnexpectedToken,
                        operand_position,
                        "IN requires a column on its left side",
                    ))
                }
            };
            if negated {
                self.advance();
            }
            self.advance();
            let values = self.parse_literal_list()?;
            let predicate = Predicate::In { column, values };
            return Ok(if negated {
                Predicate::Not(Box::new(predicate))
            } else {
                predicate
            });
        }

        let op = match self.current_token() {
            Some(token) if token.kind == TokenKind::Operator => match token.text.as_str() {
                "=" => CompareOp::Eq,
                "<>" | "!=" => CompareOp::NotEq,
                "<" => CompareOp::Lt,
                "<=" => CompareOp::LtEq,
                ">" => CompareOp::Gt,
                ">=" => CompareOp::GtEq,
                "LIKE" => CompareOp::Like,
                _ => return Err(self.unexpected("comparison operator")),
            },
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();

        let right = self.parse_operand()?;
        Ok(Predicate::Comparison(Comparison { left, op, right }))
    }

    fn parse_literal_list(&mut self) -> Result<Vec<Literal>, SyntaxError> {
        self.expect_punctuation('(')?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if self.check_punctuation(',') {
                self.advance();
            } else {
                break;
            }
        }
        self.expect_punctuation(')')?;
        Ok(values)
    }

    fn parse_operand(&mut self) -> Result<Operand, SyntaxError> {
        match self.current_token() {
            Some(token)
                if matches!(token.kind, TokenKind::Number | TokenKind::StringLiteral) =>
            {
                Ok(Operand::Literal(self.parse_literal()?))
            }
            Some(token) if token.is_identifier() => {
                if self.at_function_call() {
                    let (function, argument) = self.parse_aggregate()?;
                    Ok(Operand::Aggregate { function, argument })
                } else {
                    Ok(Operand::Column(self.parse_qualified_name("column name")?))
                }
            }
            _ => Err(self.unexpected("column or literal")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, SyntaxError> {
        let literal = match self.current_token() {
            Some(token) if token.kind == TokenKind::Number => Literal::Number(token.text.clone()),
            Some(token) if token.kind == TokenKind::StringLiteral => {
                let text = &token.text;
                Literal::String(text[1..text.len() - 1].to_string())
            }
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(literal)
    }

    /// `COUNT(*)`, `SUM(col)` and friends. The caller has checked that the
    /// current token is an identifier followed by `(`.
    fn parse_aggregate(
        &mut self,
    ) -> Result<(AggregateFunction, Option<QualifiedName>), SyntaxError> {
        let function = match self.current_token() {
            Some(token) => match AggregateFunction::from_name(&token.text) {
                Some(function) => function,
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnexpectedToken,
                        token.position,
                        format!("Unknown function '{}'", token.text),
                    ))
                }
            },
            None => return Err(self.unexpected("function name")),
        };
        self.advance();
        self.expect_punctuation('(')?;

        let argument = if self.check_punctuation('*') {
            self.advance();
            None
        } else {
            Some(self.parse_qualified_name("column name or *")?)
        };

        self.expect_punctuation(')')?;
        Ok((function, argument))
    }

    fn parse_qualified_name(&mut self, expected: &str) -> Result<QualifiedName, SyntaxError> {
        let mut parts = vec![self.expect_identifier(expected)?];
        while self.check_punctuation('.') {
            self.advance();
            parts.push(self.expect_identifier(expected)?);
        }
        Ok(QualifiedName { parts })
    }

    // Token helpers

    fn current_token(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_keyword(keyword))
    }

    fn check_operator(&self, operator: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_operator(operator))
    }

    fn check_punctuation(&self, punctuation: char) -> bool {
        self.current_token()
            .is_some_and(|t| t.is_punctuation(punctuation))
    }

    fn peek_is_operator(&self, offset: usize, operator: &str) -> bool {
        self.tokens
            .get(self.position + offset)
            .is_some_and(|t| t.is_operator(operator))
    }

    fn at_join(&self) -> bool {
        JOIN_STARTS.iter().any(|kw| self.check_keyword(kw))
    }

    fn at_function_call(&self) -> bool {
        self.current_token().is_some_and(Token::is_identifier)
            && self
                .tokens
                .get(self.position + 1)
                .is_some_and(|t| t.is_punctuation('('))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn expect_operator(&mut self, operator: &str) -> Result<(), SyntaxError> {
        if self.check_operator(operator) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", operator)))
        }
    }

    fn expect_punctuation(&mut self, punctuation: char) -> Result<(), SyntaxError> {
        if self.check_punctuation(punctuation) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punctuation)))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, SyntaxError> {
        match self.current_token() {
            Some(token) if token.is_identifier() => {
                let name = token.text.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Runs `parse` one nesting level deeper, refusing past [`MAX_NESTING_DEPTH`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let position = self.position_of_current();
            return Err(SyntaxError::new(
                SyntaxErrorKind::NestingTooDeep,
                position,
                format!(
                    "Nesting deeper than {} levels at position {}",
                    MAX_NESTING_DEPTH, position
                ),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.current_token() {
            Some(token) => SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                token.position,
                format!(
                    "Expected {}, found '{}' at position {}",
                    expected, token.text, token.position
                ),
            ),
            None => SyntaxError::new(
                SyntaxErrorKind::UnexpectedEnd,
                self.end_position(),
                format!("Expected {}, but reached end of input", expected),
            ),
        }
    }

    fn position_of_current(&self) -> usize {
        self.current_token()
            .map(|t| t.position)
            .unwrap_or_else(|| self.end_position())
    }

    /// Character offset just past the last token.
    fn end_position(&self) -> usize {
        self.tokens
            .last()
            .map(|t| t.position + t.text.chars().count())
            .unwrap_or(0)
    }
}

/// Classification of syntax errors
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SyntaxErrorKind {
    EmptyStatement,
    UnsupportedStatement,
    JoinOutsideSelect,
    /// The named required keyword never appears
    MissingClause(String),
    UnbalancedParentheses,
    MissingComma,
    InvalidGroupByColumn,
    HavingWithoutGroupBy,
    /// Parentheses, `NOT` or derived tables nested past [`MAX_NESTING_DEPTH`]
    NestingTooDeep,
    UnexpectedToken,
    UnexpectedEnd,
}

/// A syntax error with the character offset it was detected at
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, position: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error: {}", self.message)
    }
}

impl std::error::Error for SyntaxError {}
