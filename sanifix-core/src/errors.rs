//! errors.rs - Custom error types for the sanifix-core library.
//!
//! Configuration problems are rejected before any pass runs and are reported
//! through [`SanifixError`]. Running out of a per-rule step budget is not a
//! configuration problem, so it has its own type, [`StepBudgetExceeded`], which
//! the fixpoint controller turns into a verdict instead of an error.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// This enum represents all configuration-time error types in `sanifix-core`.
///
/// `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SanifixError {
    #[error("Rule set '{0}' contains no rules")]
    EmptyRuleSet(String),

    #[error("Rule set '{0}': max_iterations must be at least 1 (got {1})")]
    InvalidIterationLimit(String, usize),

    #[error("Rule '{0}' has an empty pattern")]
    EmptyPattern(String),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Failed to compile rewrite rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}' can match the empty string and would never reach a fixed point")]
    MatchesEmptyString(String),

    #[error("Rule set '{0}' defines rule '{1}' more than once")]
    DuplicateRuleName(String, String),

    #[error("Failed to compile {0} rule(s):\n{1}")]
    InvalidRules(usize, String),
}

/// Which budget a run or a single rule application ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    /// The rule set's `max_iterations` pass limit.
    Iterations,
    /// A rule produced more matches in one application than allowed.
    RuleMatches,
    /// A rule application ran past its wall-clock allowance.
    RuleTime,
}

/// A single rule application was cut short by its step budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Rule '{rule}' exceeded its {kind:?} budget after {matches} match(es)")]
pub struct StepBudgetExceeded {
    pub rule: String,
    pub kind: BudgetKind,
    pub matches: usize,
}
