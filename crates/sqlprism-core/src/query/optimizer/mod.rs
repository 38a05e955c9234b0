/// Rule-based query optimizer
///
/// Applies a fixed, ordered list of rewrite rules to a statement. Every rule
/// runs exactly once; a rule that changes the serialized statement appends a
/// step to the optimization trace.
use super::ast::{Predicate, Statement};
use super::schema::SchemaHandle;
use std::fmt;
use tracing::{debug, trace};

mod joins;
mod predicates;
mod projection;
mod subquery;

pub use joins::{JoinReordering, RedundantJoins, UnusedJoins};
pub use predicates::{DuplicateConditions, OrToIn, RedundantPredicates, TautologyElimination};
pub use projection::{ColumnPruning, StarExpansion};
pub use subquery::SubqueryFlattening;

/// Description of the first trace step
pub const ORIGINAL_QUERY: &str = "Original query";

/// A single rewrite rule.
///
/// Rules are pure: they take a statement and return a (possibly) rewritten
/// one. A rule whose preconditions do not hold returns the statement
/// unchanged. Rules never fail.
pub trait Rule {
    /// Short machine-friendly identifier
    fn name(&self) -> &'static str;

    /// Human-readable trace label
    fn description(&self) -> &'static str;

    fn apply(&self, statement: Statement, schema: &dyn SchemaHandle) -> Statement;
}

/// One entry of the optimization trace
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationStep {
    pub description: String,
    /// The statement after this step, as canonical SQL
    pub statement: String,
}

impl OptimizationStep {
    pub fn new(description: impl Into<String>, statement: &Statement) -> Self {
        Self {
            description: description.into(),
            statement: statement.to_string(),
        }
    }
}

/// Result of optimizing a statement
#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    pub statement: Statement,
    /// Starts with the original statement, then one step per applied rule
    pub trace: Vec<OptimizationStep>,
}

/// Optimizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizerConfig {
    /// Replace an explicit projection with the columns referenced in WHERE.
    /// Changes query results, so it is off by default.
    pub prune_unused_columns: bool,
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable unused-column pruning
    pub fn with_column_pruning(mut self, enabled: bool) -> Self {
        self.prune_unused_columns = enabled;
        self
    }
}

/// The optimizer: an ordered list of rules
pub struct Optimizer {
    rules: Vec<Box<dyn Rule + Send + Sync>>,
}

impl Optimizer {
    /// Creates an optimizer with the standard rule order
    pub fn new(config: OptimizerConfig) -> Self {
        let mut rules: Vec<Box<dyn Rule + Send + Sync>> = vec![
            Box::new(TautologyElimination),
            Box::new(SubqueryFlattening),
            Box::new(RedundantPredicates),
            Box::new(RedundantJoins),
            Box::new(UnusedJoins),
            Box::new(DuplicateConditions),
            Box::new(StarExpansion),
        ];
        if config.prune_unused_columns {
            rules.push(Box::new(ColumnPruning));
        }
        rules.push(Box::new(OrToIn));
        rules.push(Box::new(JoinReordering));

        Self { rules }
    }

    /// Creates an optimizer running exactly `rules`, in order
    pub fn with_rules(rules: Vec<Box<dyn Rule + Send + Sync>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Optimize a statement, recording a trace step for every rule that
    /// changed it
    pub fn optimize(&self, statement: &Statement, schema: &dyn SchemaHandle) -> Optimized {
        let mut steps = vec![OptimizationStep::new(ORIGINAL_QUERY, statement)];
        let mut current = statement.clone();
        let mut text = steps[0].statement.clone();

        for rule in &self.rules {
            let next = rule.apply(current, schema);
            let next_text = next.to_string();
            if next_text != text {
                trace!(rule = rule.name(), sql = %next_text, "rule applied");
                steps.push(OptimizationStep {
                    description: rule.description().to_string(),
                    statement: next_text.clone(),
                });
                text = next_text;
            }
            current = next;
        }

        debug!(
            statement = current.kind(),
            applied = steps.len() - 1,
            "optimization complete"
        );

        Optimized {
            statement: current,
            trace: steps,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("rules", &self.rule_names())
            .finish()
    }
}

/// Applies `f` to the WHERE clause of SELECT, UPDATE and DELETE statements.
fn map_where(statement: &mut Statement, f: impl FnOnce(Predicate) -> Predicate) {
    if let Some(clause) = statement.where_clause_mut() {
        *clause = clause.take().map(f);
    }
}
