/// Semantic checker
///
/// Resolves table and column references against a [`SchemaHandle`] and checks
/// that literals compared with or assigned to a column belong to the column's
/// type family. The first failure in traversal order is reported.
use super::ast::*;
use super::schema::{SchemaHandle, TypeFamily};
use std::fmt;
use tracing::debug;

/// Check a statement against the schema
pub fn check(statement: &Statement, schema: &dyn SchemaHandle) -> Result<(), SemanticError> {
    let checker = Checker { schema };
    match statement {
        Statement::Select(select) => checker.check_select(select).map(|_| ()),
        Statement::Insert(insert) => checker.check_insert(insert),
        Statement::Update(update) => checker.check_update(update),
        Statement::Delete(delete) => checker.check_delete(delete),
        Statement::Drop(drop) => checker.require_table(&drop.table).map(|_| ()),
    }?;
    debug!(statement = statement.kind(), "semantic check passed");
    Ok(())
}

/// A column visible through a binding, with the base table column it comes
/// from when there is one
#[derive(Debug, Clone)]
struct BoundColumn {
    name: String,
    source: Option<(String, String)>,
}

/// A table or derived table in scope under its alias (or name)
#[derive(Debug)]
struct Binding {
    name: String,
    columns: Vec<BoundColumn>,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: Vec<Binding>,
    /// Projection aliases, usable in HAVING and ORDER BY
    aliases: Vec<String>,
}

impl Scope {
    fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    fn all_columns(&self) -> Vec<BoundColumn> {
        self.bindings
            .iter()
            .flat_map(|b| b.columns.iter().cloned())
            .collect()
    }
}

struct Checker<'s> {
    schema: &'s dyn SchemaHandle,
}

impl<'s> Checker<'s> {
    fn require_table(&self, table: &str) -> Result<Binding, SemanticError> {
        if !self.schema.exists(table) {
            return Err(SemanticError::UnknownTable(table.to_string()));
        }
        let columns = self
            .schema
            .columns_of(table)
            .into_iter()
            .map(|column| BoundColumn {
                source: Some((table.to_string(), column.clone())),
                name: column,
            })
            .collect();
        Ok(Binding {
            name: table.to_string(),
            columns,
        })
    }

    /// Checks a SELECT and returns the columns it produces.
    fn check_select(&self, select: &Select) -> Result<Vec<BoundColumn>, SemanticError> {
        let mut scope = Scope::default();

        // Tables: outer FROM first, then joins in order
        match &select.from {
            TableRef::Table { name, alias } => {
                let mut binding = self.require_table(name)?;
                if let Some(alias) = alias {
                    binding.name = alias.clone();
                }
                scope.bindings.push(binding);
            }
            TableRef::Derived { query, alias } => {
                let columns = self.check_select(query)?;
                scope.bindings.push(Binding {
                    name: alias.clone(),
                    columns,
                });
            }
        }
        for join in &select.joins {
            let mut binding = self.require_table(&join.table)?;
            binding.name = join.binding().to_string();
            scope.bindings.push(binding);
        }

        // Projection
        let mut output = Vec::new();
        for item in &select.columns {
            match item {
                SelectItem::Wildcard => output.extend(scope.all_columns()),
                SelectItem::Column { name, alias } => {
                    let source = self.resolve(&scope, name, false)?;
                    output.push(BoundColumn {
                        name: alias.clone().unwrap_or_else(|| name.name().to_string()),
                        source,
                    });
                }
                SelectItem::Aggregate {
                    function,
                    argument,
                    alias,
                } => {
                    if let Some(argument) = argument {
                        self.resolve(&scope, argument, false)?;
                    }
                    let name = match (alias, argument) {
                        (Some(alias), _) => alias.clone(),
                        (None, Some(argument)) => format!("{}({})", function, argument),
                        (None, None) => format!("{}(*)", function),
                    };
                    output.push(BoundColumn { name, source: None });
                }
            }
            if let SelectItem::Column {
                alias: Some(alias), ..
            }
            | SelectItem::Aggregate {
                alias: Some(alias), ..
            } = item
            {
                scope.aliases.push(alias.clone());
            }
        }

        for join in &select.joins {
            self.resolve(&scope, &join.on_left, false)?;
            self.resolve(&scope, &join.on_right, false)?;
        }

        if let Some(ref condition) = select.where_clause {
            self.check_predicate(&scope, condition, false)?;
        }

        for column in &select.group_by {
            self.resolve(&scope, column, false)?;
        }

        if let Some(ref condition) = select.having {
            self.check_predicate(&scope, condition, true)?;
        }

        for item in &select.order_by {
            self.resolve(&scope, &item.column, true)?;
        }

        Ok(output)
    }

    fn check_insert(&self, insert: &Insert) -> Result<(), SemanticError> {
        let binding = self.require_table(&insert.table)?;

        let targets: Vec<String> = if insert.columns.is_empty() {
            binding.columns.iter().map(|c| c.name.clone()).collect()
        } else {
            for column in &insert.columns {
                if !binding
                    .columns
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(column))
                {
                    return Err(SemanticError::UnknownColumn(column.clone()));
                }
            }
            insert.columns.clone()
        };

        for row in &insert.values {
            for (column, value) in targets.iter().zip(row) {
                self.check_literal(&insert.table, column, value)?;
            }
        }
        Ok(())
    }

    fn check_update(&self, update: &Update) -> Result<(), SemanticError> {
        let mut binding = self.require_table(&update.table)?;
        if let Some(ref alias) = update.alias {
            binding.name = alias.clone();
        }
        let scope = Scope {
            bindings: vec![binding],
            aliases: Vec::new(),
        };

        for assignment in &update.assignments {
            let target = QualifiedName::new([assignment.column.as_str()]);
            self.resolve(&scope, &target, false)?;
            match &assignment.value {
                Operand::Literal(literal) => {
                    self.check_literal(&update.table, &assignment.column, literal)?
                }
                operand => self.resolve_operand(&scope, operand, false)?,
            }
        }

        if let Some(ref condition) = update.where_clause {
            self.check_predicate(&scope, condition, false)?;
        }
        Ok(())
    }

    fn check_delete(&self, delete: &Delete) -> Result<(), SemanticError> {
        let binding = self.require_table(&delete.table)?;
        if let Some(ref condition) = delete.where_clause {
            let scope = Scope {
                bindings: vec![binding],
                aliases: Vec::new(),
            };
            self.check_predicate(&scope, condition, false)?;
        }
        Ok(())
    }

    fn check_predicate(
        &self,
        scope: &Scope,
        predicate: &Predicate,
        allow_aliases: bool,
    ) -> Result<(), SemanticError> {
        match predicate {
            Predicate::Comparison(comparison) => {
                self.resolve_operand(scope, &comparison.left, allow_aliases)?;
                self.resolve_operand(scope, &comparison.right, allow_aliases)?;

                if comparison.op == CompareOp::Eq {
                    let pair = match (&comparison.left, &comparison.right) {
                        (Operand::Column(name), Operand::Literal(literal))
                        | (Operand::Literal(literal), Operand::Column(name)) => {
                            Some((name, literal))
                        }
                        _ => None,
                    };
                    if let Some((name, literal)) = pair {
                        if let Some(source) = self.resolve(scope, name, allow_aliases)? {
                            self.check_literal(&source.0, &source.1, literal)?;
                        }
                    }
                }
                Ok(())
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    self.check_predicate(scope, child, allow_aliases)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => self.check_predicate(scope, inner, allow_aliases),
            Predicate::In { column, values } => {
                if let Some((table, name)) = self.resolve(scope, column, allow_aliases)? {
                    for value in values {
                        self.check_literal(&table, &name, value)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn resolve_operand(
        &self,
        scope: &Scope,
        operand: &Operand,
        allow_aliases: bool,
    ) -> Result<(), SemanticError> {
        match operand {
            Operand::Column(name) => self.resolve(scope, name, allow_aliases).map(|_| ()),
            Operand::Aggregate {
                argument: Some(name),
                ..
            } => self.resolve(scope, name, false).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Resolves a column reference. Returns the base table column it refers
    /// to, or `None` for derived values such as aggregates and aliases.
    fn resolve(
        &self,
        scope: &Scope,
        name: &QualifiedName,
        allow_aliases: bool,
    ) -> Result<Option<(String, String)>, SemanticError> {
        let column = name.name();

        if let Some(qualifier) = name.qualifier() {
            let binding = scope
                .binding(qualifier)
                .ok_or_else(|| SemanticError::UnknownTable(qualifier.to_string()))?;
            return binding
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(column))
                .map(|c| c.source.clone())
                .ok_or_else(|| SemanticError::UnknownColumn(name.to_string()));
        }

        for binding in &scope.bindings {
            if let Some(found) = binding
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(column))
            {
                return Ok(found.source.clone());
            }
        }

        if allow_aliases && scope.aliases.iter().any(|a| a.eq_ignore_ascii_case(column)) {
            return Ok(None);
        }

        Err(SemanticError::UnknownColumn(name.to_string()))
    }

    fn check_literal(
        &self,
        table: &str,
        column: &str,
        literal: &Literal,
    ) -> Result<(), SemanticError> {
        let mismatch = |column_type: String| SemanticError::TypeMismatch {
            column: column.to_string(),
            column_type,
            literal: literal.to_string(),
        };

        let column_type = self
            .schema
            .type_of(table, column)
            .ok_or_else(|| mismatch("unknown".to_string()))?;

        let compatible = matches!(
            (TypeFamily::of(&column_type), literal),
            (TypeFamily::Numeric, Literal::Number(_)) | (TypeFamily::Character, Literal::String(_))
        );
        if compatible {
            Ok(())
        } else {
            Err(mismatch(column_type))
        }
    }
}

/// Semantic check failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SemanticError {
    /// A table, or a qualifier naming no bound table or alias
    UnknownTable(String),
    UnknownColumn(String),
    TypeMismatch {
        column: String,
        column_type: String,
        literal: String,
    },
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::UnknownTable(name) => write!(f, "Table '{}' does not exist", name),
            SemanticError::UnknownColumn(name) => write!(f, "Column '{}' does not exist", name),
            SemanticError::TypeMismatch {
                column,
                column_type,
                literal,
            } => write!(
                f,
                "Type mismatch: column '{}' of type {} is incompatible with {}",
                column, column_type, literal
            ),
        }
    }
}

impl std::error::Error for SemanticError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::test_support::{parse_sql, TestSchema};

    fn check_sql(sql: &str) -> Result<(), SemanticError> {
        check(&parse_sql(sql), &TestSchema)
    }

    #[test]
    fn test_valid_select() {
        assert!(check_sql("SELECT id, name FROM employees WHERE age > 30").is_ok());
        assert!(check_sql(
            "SELECT e.name, d.title FROM employees e JOIN dept d ON d.id = e.dept_id WHERE d.title = 'Ops'"
        )
        .is_ok());
    }

    #[test]
    fn test_unknown_table() {
        assert_eq!(
            check_sql("SELECT * FROM payroll"),
            Err(SemanticError::UnknownTable("payroll".into()))
        );
        assert_eq!(
            check_sql("SELECT * FROM employees e JOIN payroll p ON p.id = e.id"),
            Err(SemanticError::UnknownTable("payroll".into()))
        );
        assert_eq!(
            check_sql("SELECT x.name FROM employees e"),
            Err(SemanticError::UnknownTable("x".into()))
        );
    }

    #[test]
    fn test_unknown_column() {
        assert_eq!(
            check_sql("SELECT * FROM employees WHERE salary = 1000"),
            Err(SemanticError::UnknownColumn("salary".into()))
        );
        assert_eq!(
            check_sql("SELECT e.title FROM employees e"),
            Err(SemanticError::UnknownColumn("e.title".into()))
        );
    }

    #[test]
    fn test_first_failure_in_traversal_order() {
        // Tables are resolved before any column
        assert_eq!(
            check_sql("SELECT salary FROM employees JOIN payroll ON payroll.id = employees.id"),
            Err(SemanticError::UnknownTable("payroll".into()))
        );
        // Projection before WHERE
        assert_eq!(
            check_sql("SELECT bonus FROM employees WHERE salary = 1"),
            Err(SemanticError::UnknownColumn("bonus".into()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            check_sql("SELECT * FROM employees WHERE age = 'old'"),
            Err(SemanticError::TypeMismatch {
                column: "age".into(),
                column_type: "int(11)".into(),
                literal: "'old'".into(),
            })
        );
        assert!(check_sql("SELECT * FROM employees WHERE name IN ('a', 'b')").is_ok());
        assert!(matches!(
            check_sql("SELECT * FROM employees WHERE name IN ('a', 2)"),
            Err(SemanticError::TypeMismatch { .. })
        ));
        // Only types in a known family accept literals
        assert!(matches!(
            check_sql("SELECT * FROM employees WHERE hired = '2024-01-01'"),
            Err(SemanticError::TypeMismatch { .. })
        ));
        // Ordering comparisons are not type checked
        assert!(check_sql("SELECT * FROM employees WHERE name > 3").is_ok());
    }

    #[test]
    fn test_derived_table_columns() {
        assert!(check_sql("SELECT s.name FROM (SELECT name, age FROM employees) s WHERE s.age = 3").is_ok());
        assert_eq!(
            check_sql("SELECT s.id FROM (SELECT name FROM employees) s"),
            Err(SemanticError::UnknownColumn("s.id".into()))
        );
        assert_eq!(
            check_sql("SELECT * FROM (SELECT * FROM nowhere) s"),
            Err(SemanticError::UnknownTable("nowhere".into()))
        );
    }

    #[test]
    fn test_aliases_in_having_and_order_by() {
        assert!(check_sql(
            "SELECT dept_id, COUNT(*) AS n FROM employees GROUP BY dept_id HAVING n > 1 ORDER BY n DESC"
        )
        .is_ok());
        assert_eq!(
            check_sql("SELECT name AS who FROM employees WHERE who = 'x'"),
            Err(SemanticError::UnknownColumn("who".into()))
        );
    }

    #[test]
    fn test_insert_update_delete_drop() {
        assert!(check_sql("INSERT INTO dept (id, title) VALUES (1, 'Ops')").is_ok());
        assert!(check_sql("INSERT INTO dept VALUES (1, 'Ops')").is_ok());
        assert_eq!(
            check_sql("INSERT INTO dept (id, budget) VALUES (1, 2)"),
            Err(SemanticError::UnknownColumn("budget".into()))
        );
        assert!(matches!(
            check_sql("INSERT INTO dept VALUES ('one', 'Ops')"),
            Err(SemanticError::TypeMismatch { .. })
        ));

        assert!(check_sql("UPDATE employees e SET age = 31 WHERE e.id = 1").is_ok());
        assert!(matches!(
            check_sql("UPDATE employees SET age = 'x'"),
            Err(SemanticError::TypeMismatch { .. })
        ));
        assert_eq!(
            check_sql("UPDATE employees SET salary = 1"),
            Err(SemanticError::UnknownColumn("salary".into()))
        );

        assert!(check_sql("DELETE FROM employees WHERE id = 1").is_ok());
        assert_eq!(
            check_sql("DROP TABLE payroll"),
            Err(SemanticError::UnknownTable("payroll".into()))
        );
    }
}
