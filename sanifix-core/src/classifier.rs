// sanifix-core/src/classifier.rs
//! Safety classifier for rule sets.
//!
//! Rather than trusting a hand-written claim that a one-shot rewrite "cannot
//! recreate its own pattern", the classifier runs the rule set over an
//! adversarial probe corpus (see [`crate::probes`]) and derives the answer:
//!
//! * [`Safety::UnsafeEvenAtFixpoint`] - some probe makes the fixpoint run cyclic
//!   or exhausts its budget.
//! * [`Safety::SafeIfFixpoint`] - every probe converges, but a single pass over
//!   some probe leaves a match behind.
//! * [`Safety::SafeSinglePass`] - no probe leaves a match after one pass.
//!
//! A `SafeSinglePass` answer is evidence from the corpus, not a proof.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{residual_matches, Residual};
use crate::engines::sequential::SequentialEngine;
use crate::fixpoint::FixpointController;
use crate::probes::probe_corpus;
use crate::rule_set::{Mode, RuleSet};
use crate::verdict::{Status, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Safety {
    SafeSinglePass,
    SafeIfFixpoint,
    UnsafeEvenAtFixpoint,
}

/// The probe that decided a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterexample {
    pub probe: String,
    pub single_pass_output: String,
    pub single_pass_residual: Vec<Residual>,
    pub fixpoint_status: Status,
    pub fixpoint_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub safety: Safety,
    pub probes_run: usize,
    pub counterexample: Option<Counterexample>,
}

/// Classifies `rule_set` against its generated probe corpus.
///
/// The set's own mode is ignored: probes are always run both ways, using the
/// set's iteration limit and step budgets.
pub fn classify(rule_set: &RuleSet) -> Classification {
    classify_with_probes(rule_set, &probe_corpus(rule_set))
}

/// Classifies `rule_set` against caller-supplied probes.
pub fn classify_with_probes(rule_set: &RuleSet, probes: &[String]) -> Classification {
    let fixpoint_engine = SequentialEngine::new(rule_set.clone().with_mode(Mode::Fixpoint));
    let single_engine = SequentialEngine::new(rule_set.clone().with_mode(Mode::SinglePass));
    let fixpoint = FixpointController::new(&fixpoint_engine);
    let single = FixpointController::new(&single_engine);

    let mut first_single_pass_leak: Option<Counterexample> = None;

    for probe in probes {
        let fixed = fixpoint.run(probe).verdict;
        let once = single.run(probe).verdict;
        let residual = match &once {
            Verdict::Converged { text, .. } => residual_matches(rule_set, text),
            _ => Vec::new(),
        };
        let single_pass_failed = !residual.is_empty() || !once.is_converged();

        let counterexample = || Counterexample {
            probe: probe.clone(),
            single_pass_output: once.text().to_string(),
            single_pass_residual: residual.clone(),
            fixpoint_status: fixed.status(),
            fixpoint_output: fixed.text().to_string(),
        };

        if !fixed.is_converged() {
            info!(
                "Rule set '{}' is unsafe even at fixpoint ({:?} on a probe).",
                rule_set.name(),
                fixed.status()
            );
            return Classification {
                safety: Safety::UnsafeEvenAtFixpoint,
                probes_run: probes.len(),
                counterexample: Some(counterexample()),
            };
        }

        if single_pass_failed && first_single_pass_leak.is_none() {
            debug!("Single pass of '{}' leaks on a probe.", rule_set.name());
            first_single_pass_leak = Some(counterexample());
        }
    }

    let safety = if first_single_pass_leak.is_some() {
        Safety::SafeIfFixpoint
    } else {
        Safety::SafeSinglePass
    };
    info!(
        "Rule set '{}' classified as {:?} over {} probe(s).",
        rule_set.name(),
        safety,
        probes.len()
    );
    Classification {
        safety,
        probes_run: probes.len(),
        counterexample: first_single_pass_leak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleConfig, RuleSetConfig};
    use crate::rule::PatternKind;
    use crate::sanitizers::compiler::compile_rule_set;

    fn rule_set(rules: Vec<(PatternKind, &str, &str)>) -> RuleSet {
        compile_rule_set(&RuleSetConfig {
            name: "probe".to_string(),
            rules: rules
                .into_iter()
                .enumerate()
                .map(|(i, (kind, pattern, replace_with))| RuleConfig {
                    name: format!("rule_{i}"),
                    kind,
                    pattern: pattern.to_string(),
                    replace_with: replace_with.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_dot_pair_deletion_is_single_pass_safe() {
        let set = rule_set(vec![(PatternKind::Literal, "..", "")]);
        let classification = classify(&set);
        assert_eq!(classification.safety, Safety::SafeSinglePass);
        assert!(classification.counterexample.is_none());
        assert!(classification.probes_run > 1);
    }

    #[test]
    fn test_comment_stripping_needs_fixpoint() {
        let set = rule_set(vec![(PatternKind::Regex, "<!--|--!?>", "")]);
        let classification = classify(&set);
        assert_eq!(classification.safety, Safety::SafeIfFixpoint);
        let counterexample = classification.counterexample.unwrap();
        assert!(!counterexample.single_pass_residual.is_empty());
        assert_eq!(counterexample.fixpoint_status, Status::Converged);
    }

    #[test]
    fn test_oscillating_rules_are_unsafe() {
        let set = rule_set(vec![
            (PatternKind::Literal, "ab", "ba"),
            (PatternKind::Literal, "ba", "ab"),
        ]);
        let classification = classify(&set);
        assert_eq!(classification.safety, Safety::UnsafeEvenAtFixpoint);
        assert_eq!(classification.counterexample.unwrap().fixpoint_status, Status::Cyclic);
    }
}
