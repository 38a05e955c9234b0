//! Derived-table flattening.

use super::Rule;
use crate::query::ast::*;
use crate::query::schema::SchemaHandle;

/// Replaces `(SELECT * FROM t [x] [WHERE cond]) alias` in FROM with
/// `t alias`, moving `cond` (re-qualified by `alias`) to the front of the
/// outer WHERE.
///
/// Only a single comparison or IN condition is moved; inner queries with
/// joins, grouping, ordering or an explicit projection are left alone.
pub struct SubqueryFlattening;

impl Rule for SubqueryFlattening {
    fn name(&self) -> &'static str {
        "subquery_flattening"
    }

    fn description(&self) -> &'static str {
        "Flattened subquery in FROM clause"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        if let Statement::Select(select) = &mut statement {
            flatten(select);
        }
        statement
    }
}

fn flatten(select: &mut Select) {
    let TableRef::Derived { query, alias } = &select.from else {
        return;
    };
    if !is_flattenable(query) {
        return;
    }
    let TableRef::Table {
        name: table,
        alias: inner_alias,
    } = &query.from
    else {
        return;
    };

    let inner_binding = inner_alias.as_deref().unwrap_or(table);
    let moved = query.where_clause.clone().map(|mut condition| {
        condition.for_each_column_mut(&mut |column| {
            let local = match column.qualifier() {
                None => true,
                Some(q) => q.eq_ignore_ascii_case(inner_binding),
            };
            if local {
                *column = column.qualified_by(alias);
            }
        });
        condition
    });

    let outer = select.where_clause.take();
    let conjuncts: Vec<Predicate> = moved
        .into_iter()
        .chain(outer.into_iter().flat_map(Predicate::into_conjuncts))
        .collect();

    select.from = TableRef::Table {
        name: table.clone(),
        alias: Some(alias.clone()),
    };
    select.where_clause = Predicate::from_conjuncts(conjuncts);
}

fn is_flattenable(query: &Select) -> bool {
    let simple_condition = match &query.where_clause {
        None => true,
        Some(Predicate::Comparison(_)) | Some(Predicate::In { .. }) => true,
        Some(_) => false,
    };
    query.columns == [SelectItem::Wildcard]
        && matches!(query.from, TableRef::Table { .. })
        && query.joins.is_empty()
        && query.group_by.is_empty()
        && query.having.is_none()
        && query.order_by.is_empty()
        && simple_condition
}
