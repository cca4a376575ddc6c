// sanifix-core/src/engines/sequential.rs
//! A `RewriteEngine` that applies the rules of a set one after another.
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::RuleSetConfig;
use crate::engine::{PassOutcome, RewriteEngine};
use crate::errors::StepBudgetExceeded;
use crate::rule_set::RuleSet;
use crate::sanitizers::compiler::compile_rule_set;
use crate::trace::{log_rule_step_debug, text_digest, PassTrace, RuleStep};

#[derive(Debug, Clone)]
pub struct SequentialEngine {
    rule_set: Arc<RuleSet>,
}

impl SequentialEngine {
    pub fn new(rule_set: RuleSet) -> Self {
        Self::from_shared(Arc::new(rule_set))
    }

    pub fn from_shared(rule_set: Arc<RuleSet>) -> Self {
        Self { rule_set }
    }

    pub fn from_config(config: &RuleSetConfig) -> Result<Self> {
        let rule_set = compile_rule_set(config)
            .with_context(|| format!("Failed to compile rule set '{}'", config.name))?;
        Ok(Self::new(rule_set))
    }
}

impl RewriteEngine for SequentialEngine {
    fn rewrite_pass(&self, text: &str, pass: usize) -> Result<PassOutcome, StepBudgetExceeded> {
        let rules = self.rule_set.rules();
        let pass_before_hash = text_digest(text);
        let mut steps = Vec::with_capacity(rules.len());
        let mut current = text.to_string();
        let mut before_hash = pass_before_hash.clone();
        let mut total_matches = 0usize;

        for (rule_index, rule) in rules.iter().enumerate() {
            let applied = rule.apply(&current)?;
            let after_hash = if applied.match_count == 0 {
                before_hash.clone()
            } else {
                text_digest(&applied.text)
            };
            let step = RuleStep {
                rule_index,
                rule_name: rule.name().to_string(),
                match_count: applied.match_count,
                text_before_hash: before_hash,
                text_after_hash: after_hash.clone(),
            };
            log_rule_step_debug(&step, &current, &applied.text);

            total_matches += applied.match_count;
            steps.push(step);
            current = applied.text;
            before_hash = after_hash;
        }

        Ok(PassOutcome {
            text: current,
            trace: PassTrace {
                pass,
                steps,
                total_matches,
                text_before_hash: pass_before_hash,
                text_after_hash: before_hash,
            },
        })
    }

    fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }
}
