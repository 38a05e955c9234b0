//! Projection rewrites.

use super::Rule;
use crate::query::ast::*;
use crate::query::schema::SchemaHandle;

/// Expands `SELECT * FROM t` into the catalog's column list for `t`.
pub struct StarExpansion;

impl Rule for StarExpansion {
    fn name(&self) -> &'static str {
        "star_expansion"
    }

    fn description(&self) -> &'static str {
        "Replaced SELECT * with explicit column names"
    }

    fn apply(&self, mut statement: Statement, schema: &dyn SchemaHandle) -> Statement {
        if let Statement::Select(select) = &mut statement {
            if select.columns != [SelectItem::Wildcard] || !select.joins.is_empty() {
                return statement;
            }
            if let TableRef::Table { name, .. } = &select.from {
                let columns = schema.columns_of(name);
                if !columns.is_empty() {
                    select.columns = columns.into_iter().map(plain_column).collect();
                }
            }
        }
        statement
    }
}

/// Replaces the projection with the columns referenced in WHERE, in catalog
/// order, or with every catalog column when WHERE references none.
///
/// This changes the result set and is only installed when
/// [`OptimizerConfig::prune_unused_columns`](super::OptimizerConfig) is set.
pub struct ColumnPruning;

impl Rule for ColumnPruning {
    fn name(&self) -> &'static str {
        "column_pruning"
    }

    fn description(&self) -> &'static str {
        "Pruned unused columns from SELECT list"
    }

    fn apply(&self, mut statement: Statement, schema: &dyn SchemaHandle) -> Statement {
        let Statement::Select(select) = &mut statement else {
            return statement;
        };
        let TableRef::Table { name, .. } = &select.from else {
            return statement;
        };
        let explicit = select
            .columns
            .iter()
            .all(|item| matches!(item, SelectItem::Column { .. }));
        if !select.joins.is_empty() || !explicit {
            return statement;
        }

        let catalog = schema.columns_of(name);
        if catalog.is_empty() {
            return statement;
        }

        let mut referenced: Vec<&str> = Vec::new();
        if let Some(ref condition) = select.where_clause {
            condition.for_each_column(&mut |column| referenced.push(column.name()));
        }

        let kept: Vec<String> = catalog
            .iter()
            .filter(|c| referenced.iter().any(|r| r.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();
        let columns = if kept.is_empty() { catalog } else { kept };

        select.columns = columns.into_iter().map(plain_column).collect();
        statement
    }
}

fn plain_column(name: String) -> SelectItem {
    SelectItem::Column {
        name: QualifiedName::new([name]),
        alias: None,
    }
}
