// sanifix-core/src/engine.rs
//! Defines the core RewriteEngine trait.
//!
//! An engine performs exactly one pass of a rule set and reports what it did.
//! It never iterates on its own; deciding how many passes are needed is the
//! job of [`crate::fixpoint::FixpointController`].
//!
//! License: MIT OR APACHE 2.0

use crate::errors::StepBudgetExceeded;
use crate::rule_set::RuleSet;
use crate::trace::PassTrace;

/// The text produced by one pass and the trace entry describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub text: String,
    pub trace: PassTrace,
}

/// A pluggable single-pass rewriter.
///
/// Implementations must be pure: the same rule set and text always give the
/// same outcome, and no state is kept between calls.
pub trait RewriteEngine: Send + Sync {
    /// Applies every rule of the engine's rule set once, in order.
    ///
    /// # Arguments
    /// * `text` - The input of this pass.
    /// * `pass` - 1-based index of the pass, recorded in the trace.
    fn rewrite_pass(&self, text: &str, pass: usize) -> Result<PassOutcome, StepBudgetExceeded>;

    /// Returns the rule set the engine applies.
    fn rule_set(&self) -> &RuleSet;
}
