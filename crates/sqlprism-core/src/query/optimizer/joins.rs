//! Join rewrites: duplicate removal, unused join elimination and reordering.

use super::Rule;
use crate::query::ast::*;
use crate::query::schema::SchemaHandle;
use std::collections::HashSet;

/// Removes joins repeating an earlier (table, ON left, ON right) triple.
pub struct RedundantJoins;

impl Rule for RedundantJoins {
    fn name(&self) -> &'static str {
        "redundant_joins"
    }

    fn description(&self) -> &'static str {
        "Removed redundant joins"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        if let Statement::Select(select) = &mut statement {
            let mut seen = HashSet::new();
            select.joins.retain(|join| {
                seen.insert((
                    join.table.to_ascii_lowercase(),
                    join.on_left.to_string().to_ascii_lowercase(),
                    join.on_right.to_string().to_ascii_lowercase(),
                ))
            });
        }
        statement
    }
}

/// Removes joins whose table is never referenced outside their own ON clause.
///
/// A bare `*` does not count as a reference. An unqualified column keeps a
/// join alive when the joined table has such a column, or when the schema
/// does not know the table.
pub struct UnusedJoins;

impl Rule for UnusedJoins {
    fn name(&self) -> &'static str {
        "unused_joins"
    }

    fn description(&self) -> &'static str {
        "Eliminated unused joins"
    }

    fn apply(&self, mut statement: Statement, schema: &dyn SchemaHandle) -> Statement {
        let Statement::Select(select) = &mut statement else {
            return statement;
        };

        // Removing one join can leave another referenced only by the removed
        // join's ON clause.
        while let Some(index) = (0..select.joins.len()).find(|&i| is_unused(select, i, schema)) {
            select.joins.remove(index);
        }
        statement
    }
}

fn is_unused(select: &Select, index: usize, schema: &dyn SchemaHandle) -> bool {
    let join = &select.joins[index];
    let binding = join.binding();
    let mut used = false;

    for_each_reference(select, index, &mut |name| {
        if used {
            return;
        }
        used = match name.qualifier() {
            Some(qualifier) => {
                qualifier.eq_ignore_ascii_case(binding)
                    || qualifier.eq_ignore_ascii_case(&join.table)
            }
            None => !schema.exists(&join.table) || schema.has_column(&join.table, name.name()),
        };
    });

    !used
}

/// Visits every column reference of `select` except the ON clause of the
/// join at `skip_join`. Derived tables are their own scope and not visited.
fn for_each_reference<'a>(
    select: &'a Select,
    skip_join: usize,
    visit: &mut impl FnMut(&'a QualifiedName),
) {
    for item in &select.columns {
        match item {
            SelectItem::Column { name, .. } => visit(name),
            SelectItem::Aggregate {
                argument: Some(name),
                ..
            } => visit(name),
            _ => {}
        }
    }
    for (i, join) in select.joins.iter().enumerate() {
        if i != skip_join {
            visit(&join.on_left);
            visit(&join.on_right);
        }
    }
    if let Some(ref condition) = select.where_clause {
        condition.for_each_column(visit);
    }
    for column in &select.group_by {
        visit(column);
    }
    if let Some(ref condition) = select.having {
        condition.for_each_column(visit);
    }
    for item in &select.order_by {
        visit(&item.column);
    }
}

/// Sorts inner joins alphabetically by table name.
///
/// The sort is a placeholder ordering policy, but a plain sort can change
/// results or produce invalid SQL, so two guards sit on top of it. Any LEFT or
/// RIGHT join leaves the order untouched, since outer joins do not commute.
/// The new order is also discarded unless every ON column is qualified with a
/// table introduced at or before its own join; an unqualified ON column cannot
/// be placed and blocks reordering as well.
pub struct JoinReordering;

impl Rule for JoinReordering {
    fn name(&self) -> &'static str {
        "join_reordering"
    }

    fn description(&self) -> &'static str {
        "Reordered joins alphabetically by table name"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        let Statement::Select(select) = &mut statement else {
            return statement;
        };
        if select.joins.len() < 2 || select.joins.iter().any(|j| j.kind != JoinKind::Inner) {
            return statement;
        }

        let mut reordered = select.joins.clone();
        reordered.sort_by_key(|join| join.table.to_ascii_lowercase());

        if reordered != select.joins && references_only_earlier(select.from.binding(), &reordered) {
            select.joins = reordered;
        }
        statement
    }
}

fn references_only_earlier(from: &str, joins: &[JoinClause]) -> bool {
    let mut introduced = vec![from];
    for join in joins {
        introduced.push(join.binding());
        let known = |name: &QualifiedName| {
            name.qualifier()
                .is_some_and(|q| introduced.iter().any(|b| b.eq_ignore_ascii_case(q)))
        };
        if !known(&join.on_left) || !known(&join.on_right) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::test_support::{parse_sql, TestSchema};

    fn run(rule: &dyn Rule, sql: &str) -> String {
        rule.apply(parse_sql(sql), &TestSchema).to_string()
    }

    #[test]
    fn test_redundant_joins() {
        assert_eq!(
            run(
                &RedundantJoins,
                "SELECT * FROM employees e JOIN dept d ON d.id = e.dept_id JOIN DEPT d ON D.id = e.dept_id"
            ),
            "SELECT * FROM employees e JOIN dept d ON d.id = e.dept_id"
        );
    }

    #[test]
    fn test_unused_join_removed() {
        assert_eq!(
            run(
                &UnusedJoins,
                "SELECT e.name FROM employees e JOIN dept d ON d.id = e.dept_id WHERE e.age > 3"
            ),
            "SELECT e.name FROM employees e WHERE e.age > 3"
        );
    }

    #[test]
    fn test_unused_join_removed_under_wildcard() {
        assert_eq!(
            run(&UnusedJoins, "SELECT * FROM employees x JOIN dept d ON d.id = x.dept_id"),
            "SELECT * FROM employees x"
        );
        assert_eq!(
            run(
                &UnusedJoins,
                "SELECT * FROM employees x JOIN dept d ON d.id = x.dept_id WHERE d.title = 'Ops'"
            ),
            "SELECT * FROM employees x JOIN dept d ON d.id = x.dept_id WHERE d.title = 'Ops'"
        );
    }

    #[test]
    fn test_used_joins_kept() {
        for sql in [
            "SELECT e.name FROM employees e JOIN dept d ON d.id = e.dept_id WHERE d.title = 'x'",
            "SELECT e.name FROM employees e JOIN dept d ON d.id = e.dept_id ORDER BY d.title",
            // `title` can only come from dept
            "SELECT title FROM employees e JOIN dept d ON d.id = e.dept_id",
            // unknown table: cannot tell where `name` comes from
            "SELECT name FROM employees e JOIN payroll p ON p.id = e.id",
        ] {
            assert_eq!(run(&UnusedJoins, sql), sql);
        }
    }

    #[test]
    fn test_unused_join_chain_removed() {
        assert_eq!(
            run(
                &UnusedJoins,
                "SELECT e.name FROM employees e JOIN dept d ON d.id = e.dept_id JOIN staff s ON s.id = d.id"
            ),
            "SELECT e.name FROM employees e"
        );
    }

    #[test]
    fn test_join_reordering() {
        assert_eq!(
            run(
                &JoinReordering,
                "SELECT * FROM employees e JOIN staff s ON s.id = e.id JOIN dept d ON d.id = e.dept_id"
            ),
            "SELECT * FROM employees e JOIN dept d ON d.id = e.dept_id JOIN staff s ON s.id = e.id"
        );
    }

    #[test]
    fn test_join_reordering_preconditions() {
        for sql in [
            // would move `s` ahead of `d`, which it refers to
            "SELECT * FROM employees e JOIN staff s ON s.id = e.id JOIN dept d ON d.id = s.id",
            "SELECT * FROM employees e LEFT JOIN staff s ON s.id = e.id JOIN dept d ON d.id = e.dept_id",
            "SELECT * FROM employees e JOIN staff s ON s.id = id JOIN dept d ON d.id = e.dept_id",
        ] {
            assert_eq!(run(&JoinReordering, sql), sql);
        }
    }
}
