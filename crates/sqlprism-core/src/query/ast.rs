/// Abstract Syntax Tree (AST) node types for SQL statements
///
/// Defines the structure of parsed SELECT, INSERT, UPDATE, DELETE and DROP
/// statements. The [`fmt::Display`] implementations produce canonical SQL text
/// which re-parses to an equal tree.
use std::cmp::Ordering;
use std::fmt;

/// A parsed SQL statement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Drop(Drop),
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Select {
    pub columns: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Predicate>,
    pub group_by: Vec<QualifiedName>,
    pub having: Option<Predicate>,
    pub order_by: Vec<OrderByItem>,
}

/// A projection item in the SELECT list
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectItem {
    /// SELECT *
    Wildcard,
    /// SELECT column or SELECT column AS alias
    Column {
        name: QualifiedName,
        alias: Option<String>,
    },
    /// SELECT COUNT(*), SUM(column), etc.
    Aggregate {
        function: AggregateFunction,
        argument: Option<QualifiedName>,
        alias: Option<String>,
    },
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// A table in a FROM clause
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableRef {
    /// `orders` or `orders o`
    Table { name: String, alias: Option<String> },
    /// `(SELECT ...) alias`
    Derived { query: Box<Select>, alias: String },
}

/// `[INNER|LEFT|RIGHT] JOIN table [alias] ON left = right`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on_left: QualifiedName,
    pub on_right: QualifiedName,
}

/// Types of joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

/// A dotted name such as `e.dept_id` or `dept_id`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualifiedName {
    pub parts: Vec<String>,
}

/// Boolean condition tree for WHERE and HAVING
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predicate {
    Comparison(Comparison),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// column IN (value1, value2, ...)
    In {
        column: QualifiedName,
        values: Vec<Literal>,
    },
}

/// `left op right`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comparison {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Eq,    // =
    NotEq, // <> or !=
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=
    Like,  // LIKE
}

/// One side of a comparison or the right side of an assignment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    Column(QualifiedName),
    Literal(Literal),
    Aggregate {
        function: AggregateFunction,
        argument: Option<QualifiedName>,
    },
}

/// Literal values. Numbers keep their source spelling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Number(String),
    String(String),
}

/// A column in ORDER BY
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderByItem {
    pub column: QualifiedName,
    pub direction: Option<OrderDirection>,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// INSERT INTO table [(columns)] VALUES (row), (row) ...
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Literal>>,
}

/// UPDATE table [alias] SET assignments [WHERE condition]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Update {
    pub table: String,
    pub alias: Option<String>,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Predicate>,
}

/// `column = value` inside SET
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub column: String,
    pub value: Operand,
}

/// DELETE FROM table [WHERE condition]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delete {
    pub table: String,
    pub where_clause: Option<Predicate>,
}

/// DROP TABLE table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Drop {
    pub table: String,
}

impl Statement {
    /// Leading keyword of the statement.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::Drop(_) => "DROP",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    /// Mutable access to the WHERE clause of statements that have one.
    pub fn where_clause_mut(&mut self) -> Option<&mut Option<Predicate>> {
        match self {
            Statement::Select(select) => Some(&mut select.where_clause),
            Statement::Update(update) => Some(&mut update.where_clause),
            Statement::Delete(delete) => Some(&mut delete.where_clause),
            Statement::Insert(_) | Statement::Drop(_) => None,
        }
    }
}

impl TableRef {
    /// Name other clauses use to refer to this table: the alias if present.
    pub fn binding(&self) -> &str {
        match self {
            TableRef::Table { name, alias } => alias.as_deref().unwrap_or(name),
            TableRef::Derived { alias, .. } => alias,
        }
    }
}

impl JoinClause {
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl QualifiedName {
    pub fn new<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `a.b.c` by splitting on dots. Intended for tests and callers
    /// that already hold validated names.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.'))
    }

    /// The final component: the column (or table) name itself.
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// The component immediately before the name, if any.
    pub fn qualifier(&self) -> Option<&str> {
        match self.parts.len() {
            0 | 1 => None,
            n => Some(&self.parts[n - 2]),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// Replaces (or adds) the qualifier.
    pub fn qualified_by(&self, qualifier: &str) -> Self {
        Self::new([qualifier, self.name()])
    }

    pub fn eq_ignore_case(&self, other: &QualifiedName) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Predicate {
    /// Builds an AND node, flattening nested ANDs. A single child is returned
    /// as-is.
    pub fn and(children: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Predicate::And(flat)
        }
    }

    /// Builds an OR node, flattening nested ORs.
    pub fn or(children: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Predicate::Or(flat)
        }
    }

    /// Splits a condition into its top-level AND conjuncts.
    pub fn into_conjuncts(self) -> Vec<Predicate> {
        match self {
            Predicate::And(children) => children,
            other => vec![other],
        }
    }

    /// Inverse of [`Predicate::into_conjuncts`]. An empty list means there is
    /// no condition at all.
    pub fn from_conjuncts(mut conjuncts: Vec<Predicate>) -> Option<Predicate> {
        match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(Predicate::and(conjuncts)),
        }
    }

    /// Calls `visit` on every column name referenced by this condition, in
    /// left-to-right order.
    pub fn for_each_column<'a>(&'a self, visit: &mut impl FnMut(&'a QualifiedName)) {
        match self {
            Predicate::Comparison(comparison) => {
                comparison.left.for_each_column(visit);
                comparison.right.for_each_column(visit);
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.for_each_column(visit);
                }
            }
            Predicate::Not(inner) => inner.for_each_column(visit),
            Predicate::In { column, .. } => visit(column),
        }
    }

    /// Mutable counterpart of [`Predicate::for_each_column`].
    pub fn for_each_column_mut(&mut self, visit: &mut impl FnMut(&mut QualifiedName)) {
        match self {
            Predicate::Comparison(comparison) => {
                comparison.left.for_each_column_mut(visit);
                comparison.right.for_each_column_mut(visit);
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.for_each_column_mut(visit);
                }
            }
            Predicate::Not(inner) => inner.for_each_column_mut(visit),
            Predicate::In { column, .. } => visit(column),
        }
    }
}

impl Operand {
    pub fn for_each_column<'a>(&'a self, visit: &mut impl FnMut(&'a QualifiedName)) {
        match self {
            Operand::Column(name) => visit(name),
            Operand::Aggregate {
                argument: Some(name),
                ..
            } => visit(name),
            _ => {}
        }
    }

    pub fn for_each_column_mut(&mut self, visit: &mut impl FnMut(&mut QualifiedName)) {
        match self {
            Operand::Column(name) => visit(name),
            Operand::Aggregate {
                argument: Some(name),
                ..
            } => visit(name),
            _ => {}
        }
    }

    pub fn as_column(&self) -> Option<&QualifiedName> {
        match self {
            Operand::Column(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Operand::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

impl Literal {
    /// Orders two number literals by their exact decimal value, so `1.50`
    /// equals `1.5` and twenty-digit values never round together.
    pub fn compare_number(&self, other: &Literal) -> Option<Ordering> {
        let (Literal::Number(a), Literal::Number(b)) = (self, other) else {
            return None;
        };
        let (a_integer, a_fraction) = decimal_digits(a)?;
        let (b_integer, b_fraction) = decimal_digits(b)?;
        Some(
            a_integer
                .len()
                .cmp(&b_integer.len())
                .then_with(|| a_integer.cmp(b_integer))
                .then_with(|| a_fraction.cmp(b_fraction)),
        )
    }
}

/// Integer digits without leading zeros and fraction digits without
/// trailing zeros.
fn decimal_digits(text: &str) -> Option<(&str, &str)> {
    let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));
    let digits = integer.len() + fraction.len();
    if digits == 0 || !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((integer.trim_start_matches('0'), fraction.trim_end_matches('0')))
}

impl AggregateFunction {
    /// Looks up an aggregate by (case-insensitive) function name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }
}

// Display implementations produce the canonical SQL text

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: &Option<String>) -> fmt::Result {
    if let Some(ref alias) = alias {
        write!(f, " AS {}", alias)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(select) => write!(f, "{}", select),
            Statement::Insert(insert) => write!(f, "{}", insert),
            Statement::Update(update) => write!(f, "{}", update),
            Statement::Delete(delete) => write!(f, "{}", delete),
            Statement::Drop(drop) => write!(f, "{}", drop),
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        write_list(f, &self.columns)?;
        write!(f, " FROM {}", self.from)?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if let Some(ref condition) = self.where_clause {
            write!(f, " WHERE {}", condition)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(ref condition) = self.having {
            write!(f, " HAVING {}", condition)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard => write!(f, "*"),
            SelectItem::Column { name, alias } => {
                write!(f, "{}", name)?;
                write_alias(f, alias)
            }
            SelectItem::Aggregate {
                function,
                argument,
                alias,
            } => {
                match argument {
                    Some(column) => write!(f, "{}({})", function, column)?,
                    None => write!(f, "{}(*)", function)?,
                }
                write_alias(f, alias)
            }
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Sum => write!(f, "SUM"),
            AggregateFunction::Avg => write!(f, "AVG"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Max => write!(f, "MAX"),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Table { name, alias } => {
                write!(f, "{}", name)?;
                if let Some(ref alias) = alias {
                    write!(f, " {}", alias)?;
                }
                Ok(())
            }
            TableRef::Derived { query, alias } => write!(f, "({}) {}", query, alias),
        }
    }
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.table)?;
        if let Some(ref alias) = self.alias {
            write!(f, " {}", alias)?;
        }
        write!(f, " ON {} = {}", self.on_left, self.on_right)
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison(comparison) => write!(f, "{}", comparison),
            // OR binds tighter than AND, so OR groups need no parentheses here.
            Predicate::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    match child {
                        Predicate::And(_) => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
            Predicate::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    match child {
                        Predicate::And(_) | Predicate::Or(_) => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
            Predicate::Not(inner) => match inner.as_ref() {
                Predicate::And(_) | Predicate::Or(_) => write!(f, "NOT ({})", inner),
                _ => write!(f, "NOT {}", inner),
            },
            Predicate::In { column, values } => {
                write!(f, "{} IN (", column)?;
                write_list(f, values)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "<>"),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
            CompareOp::Like => write!(f, "LIKE"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(name) => write!(f, "{}", name),
            Operand::Literal(literal) => write!(f, "{}", literal),
            Operand::Aggregate {
                function,
                argument: Some(column),
            } => write!(f, "{}({})", function, column),
            Operand::Aggregate {
                function,
                argument: None,
            } => write!(f, "{}(*)", function),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        match self.direction {
            Some(OrderDirection::Asc) => write!(f, " ASC"),
            Some(OrderDirection::Desc) => write!(f, " DESC"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {}", self.table)?;
        if !self.columns.is_empty() {
            write!(f, " (")?;
            write_list(f, &self.columns)?;
            write!(f, ")")?;
        }
        write!(f, " VALUES ")?;
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "(")?;
            write_list(f, row)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {}", self.table)?;
        if let Some(ref alias) = self.alias {
            write!(f, " {}", alias)?;
        }
        write!(f, " SET ")?;
        write_list(f, &self.assignments)?;
        if let Some(ref condition) = self.where_clause {
            write!(f, " WHERE {}", condition)?;
        }
        Ok(())
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

impl fmt::Display for Delete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.table)?;
        if let Some(ref condition) = self.where_clause {
            write!(f, " WHERE {}", condition)?;
        }
        Ok(())
    }
}

impl fmt::Display for Drop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DROP TABLE {}", self.table)
    }
}
