// sanifix-core/src/rule_set.rs
//! An ordered collection of rules plus the policy for applying them.
//!
//! Order matters: within one pass every rule sees the output of the rules
//! before it.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{SanifixError, StepBudgetExceeded};
use crate::rule::{Rule, StepBudget};

/// Pass limit used when a rule set does not configure one.
pub const DEFAULT_MAX_ITERATIONS: usize = 32;

/// How many times a rule set is applied to its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Apply every rule exactly once, in order, and stop.
    SinglePass,
    /// Repeat passes until no rule matches.
    #[default]
    Fixpoint,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
    mode: Mode,
    max_iterations: usize,
}

impl RuleSet {
    /// Builds a rule set in [`Mode::Fixpoint`] with [`DEFAULT_MAX_ITERATIONS`].
    ///
    /// Rule names must be unique within the set; reports and traces refer to
    /// rules by name.
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Result<Self, SanifixError> {
        let name = name.into();
        if rules.is_empty() {
            return Err(SanifixError::EmptyRuleSet(name));
        }
        let duplicate = {
            let mut seen = HashSet::new();
            rules.iter().find(|r| !seen.insert(r.name())).map(|r| r.name().to_string())
        };
        if let Some(rule_name) = duplicate {
            return Err(SanifixError::DuplicateRuleName(name, rule_name));
        }
        Ok(Self {
            name,
            rules,
            mode: Mode::Fixpoint,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        })
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self, SanifixError> {
        if max_iterations < 1 {
            return Err(SanifixError::InvalidIterationLimit(self.name, max_iterations));
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    /// Replaces the step budget of every rule in the set.
    pub fn with_step_budget(mut self, budget: StepBudget) -> Self {
        self.rules = self.rules.into_iter().map(|r| r.with_budget(budget)).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Runs every rule once, in order, feeding each rule's output to the next.
    ///
    /// Returns the final text and the sum of all rules' match counts.
    pub fn apply_once(&self, text: &str) -> Result<(String, usize), StepBudgetExceeded> {
        let mut current = text.to_string();
        let mut total_matches = 0usize;
        for rule in &self.rules {
            let applied = rule.apply(&current)?;
            total_matches += applied.match_count;
            current = applied.text;
        }
        Ok((current, total_matches))
    }
}
