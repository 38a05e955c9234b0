//! Rules that rewrite WHERE conditions.

use super::{map_where, Rule};
use crate::query::ast::*;
use crate::query::schema::SchemaHandle;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Removes `literal = literal` conditions such as `WHERE 1=1`.
///
/// A tautological AND conjunct is dropped, an OR group containing one becomes
/// a tautology itself, and a WHERE or HAVING left empty is removed. Applies to
/// derived tables in FROM as well.
pub struct TautologyElimination;

impl Rule for TautologyElimination {
    fn name(&self) -> &'static str {
        "tautology_elimination"
    }

    fn description(&self) -> &'static str {
        "Removed always-true conditions such as 'WHERE 1=1'"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        match &mut statement {
            Statement::Select(select) => simplify_select(select),
            other => {
                if let Some(clause) = other.where_clause_mut() {
                    *clause = clause.take().and_then(simplify);
                }
            }
        }
        statement
    }
}

fn simplify_select(select: &mut Select) {
    if let TableRef::Derived { query, .. } = &mut select.from {
        simplify_select(query);
    }
    select.where_clause = select.where_clause.take().and_then(simplify);
    select.having = select.having.take().and_then(simplify);
}

/// Returns `None` when the whole condition is always true.
fn simplify(predicate: Predicate) -> Option<Predicate> {
    match predicate {
        Predicate::Comparison(ref comparison) if is_tautology(comparison) => None,
        Predicate::And(children) => {
            let kept: Vec<Predicate> = children.into_iter().filter_map(simplify).collect();
            Predicate::from_conjuncts(kept)
        }
        Predicate::Or(children) => {
            let mut kept = Vec::with_capacity(children.len());
            for child in children {
                kept.push(simplify(child)?);
            }
            Some(Predicate::or(kept))
        }
        other => Some(other),
    }
}

fn is_tautology(comparison: &Comparison) -> bool {
    if comparison.op != CompareOp::Eq {
        return false;
    }
    match (&comparison.left, &comparison.right) {
        (Operand::Literal(Literal::String(a)), Operand::Literal(Literal::String(b))) => a == b,
        (Operand::Literal(a @ Literal::Number(_)), Operand::Literal(b @ Literal::Number(_))) => {
            a == b || a.compare_number(b) == Some(Ordering::Equal)
        }
        _ => false,
    }
}

/// Keeps only the tightest numeric bound per column and direction:
/// `age > 30 AND age > 25` becomes `age > 30`.
pub struct RedundantPredicates;

impl Rule for RedundantPredicates {
    fn name(&self) -> &'static str {
        "redundant_predicates"
    }

    fn description(&self) -> &'static str {
        "Simplified redundant predicates in WHERE clause"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        map_where(&mut statement, collapse_bounds);
        statement
    }
}

/// A numeric bound on a column: `column > value` and friends
struct Bound {
    column: String,
    lower: bool,
    strict: bool,
    value: Literal,
}

impl Bound {
    fn of(predicate: &Predicate) -> Option<Bound> {
        let Predicate::Comparison(Comparison {
            left: Operand::Column(column),
            op,
            right: Operand::Literal(literal),
        }) = predicate
        else {
            return None;
        };
        let (lower, strict) = match op {
            CompareOp::Gt => (true, true),
            CompareOp::GtEq => (true, false),
            CompareOp::Lt => (false, true),
            CompareOp::LtEq => (false, false),
            _ => return None,
        };
        // rejects strings and malformed numbers
        literal.compare_number(literal)?;
        Some(Bound {
            column: column.to_string().to_ascii_lowercase(),
            lower,
            strict,
            value: literal.clone(),
        })
    }

    fn same_group(&self, other: &Bound) -> bool {
        self.column == other.column && self.lower == other.lower
    }

    fn tighter_than(&self, other: &Bound) -> bool {
        match self.value.compare_number(&other.value) {
            Some(Ordering::Equal) => self.strict && !other.strict,
            Some(Ordering::Greater) => self.lower,
            Some(Ordering::Less) => !self.lower,
            None => false,
        }
    }
}

fn collapse_bounds(predicate: Predicate) -> Predicate {
    let conjuncts = predicate.into_conjuncts();

    // (first index, tightest index) per group
    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut group_of: Vec<Option<usize>> = vec![None; conjuncts.len()];
    let bounds: Vec<Option<Bound>> = conjuncts.iter().map(Bound::of).collect();

    for (i, bound) in bounds.iter().enumerate() {
        let Some(bound) = bound else { continue };
        let existing = groups.iter().position(|&(first, _)| {
            bounds[first]
                .as_ref()
                .is_some_and(|other| other.same_group(bound))
        });
        match existing {
            Some(g) => {
                group_of[i] = Some(g);
                let best = groups[g].1;
                if bounds[best].as_ref().is_some_and(|b| bound.tighter_than(b)) {
                    groups[g].1 = i;
                }
            }
            None => {
                group_of[i] = Some(groups.len());
                groups.push((i, i));
            }
        }
    }

    let mut kept = Vec::with_capacity(conjuncts.len());
    for (i, conjunct) in conjuncts.iter().enumerate() {
        match group_of[i] {
            Some(g) if groups[g].0 == i => kept.push(conjuncts[groups[g].1].clone()),
            Some(_) => {}
            None => kept.push(conjunct.clone()),
        }
    }

    Predicate::and(kept)
}

/// Drops repeated AND conjuncts, comparing their case-folded SQL text.
pub struct DuplicateConditions;

impl Rule for DuplicateConditions {
    fn name(&self) -> &'static str {
        "duplicate_conditions"
    }

    fn description(&self) -> &'static str {
        "Removed duplicate conditions from WHERE clause"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        map_where(&mut statement, dedupe_conjuncts);
        statement
    }
}

fn dedupe_conjuncts(predicate: Predicate) -> Predicate {
    let mut seen = HashSet::new();
    let kept = predicate
        .into_conjuncts()
        .into_iter()
        .filter(|conjunct| seen.insert(conjunct.to_string().trim().to_lowercase()))
        .collect();
    Predicate::and(kept)
}

/// Rewrites `x = 'A' OR x = 'B'` into `x IN ('A', 'B')` within each AND
/// conjunct.
pub struct OrToIn;

impl Rule for OrToIn {
    fn name(&self) -> &'static str {
        "or_to_in"
    }

    fn description(&self) -> &'static str {
        "Converted OR chains to IN clauses"
    }

    fn apply(&self, mut statement: Statement, _schema: &dyn SchemaHandle) -> Statement {
        map_where(&mut statement, |predicate| {
            let converted: Vec<Predicate> = predicate
                .into_conjuncts()
                .into_iter()
                .map(|conjunct| match conjunct {
                    Predicate::Or(alternatives) => convert_or(alternatives),
                    other => other,
                })
                .collect();
            // A converted group may now repeat an existing conjunct
            dedupe_conjuncts(Predicate::and(converted))
        });
        statement
    }
}

/// `column = literal` or `literal = column`
fn equality(predicate: &Predicate) -> Option<(&QualifiedName, &Literal)> {
    match predicate {
        Predicate::Comparison(Comparison {
            left: Operand::Column(column),
            op: CompareOp::Eq,
            right: Operand::Literal(literal),
        })
        | Predicate::Comparison(Comparison {
            left: Operand::Literal(literal),
            op: CompareOp::Eq,
            right: Operand::Column(column),
        }) => Some((column, literal)),
        _ => None,
    }
}

/// Converts the whole group or nothing: every alternative must be an
/// equality against a literal on one and the same column.
fn convert_or(alternatives: Vec<Predicate>) -> Predicate {
    match in_list(&alternatives) {
        Some(predicate) => predicate,
        None => Predicate::or(alternatives),
    }
}

fn in_list(alternatives: &[Predicate]) -> Option<Predicate> {
    if alternatives.len() < 2 {
        return None;
    }
    let (column, _) = equality(&alternatives[0])?;
    let mut values = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        let (name, literal) = equality(alternative)?;
        if !name.eq_ignore_case(column) {
            return None;
        }
        values.push(literal.clone());
    }
    Some(Predicate::In {
        column: column.clone(),
        values,
    })
}
