// sanifix-core/src/fixpoint.rs
//! The fixpoint controller: decides how many passes a rule set gets.
//!
//! A run starts in the running state and ends in exactly one of the terminal
//! [`Verdict`]s:
//!
//! * `Converged` - a pass found no match at all, so no further pass can change
//!   the text. In [`Mode::SinglePass`] the run always ends here after one pass,
//!   whether or not matches remain.
//! * `BudgetExceeded` - more than `max_iterations` passes produced matches, or a
//!   rule ran out of its step budget mid-pass.
//! * `Cyclic` - a pass produced text already produced by an earlier pass. The
//!   rule set oscillates and will never converge; this is never retried.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::engine::RewriteEngine;
use crate::errors::BudgetKind;
use crate::rule_set::Mode;
use crate::trace::{loggable_text, PassTrace};
use crate::verdict::Verdict;

/// Everything a run produced: its verdict and one trace entry per pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitization {
    pub verdict: Verdict,
    pub trace: Vec<PassTrace>,
}

impl Sanitization {
    /// Total matches of each completed pass, in order.
    pub fn matches_per_pass(&self) -> Vec<usize> {
        self.trace.iter().map(|t| t.total_matches).collect()
    }
}

/// Drives repeated passes of a [`RewriteEngine`].
///
/// The controller holds no state between calls; each [`run`](Self::run) owns
/// its trace and digest table, so one controller can serve many threads.
pub struct FixpointController<'a> {
    engine: &'a dyn RewriteEngine,
}

impl<'a> FixpointController<'a> {
    pub fn new(engine: &'a dyn RewriteEngine) -> Self {
        Self { engine }
    }

    /// Runs the engine's rule set over `text` according to its mode.
    pub fn run(&self, text: &str) -> Sanitization {
        let rule_set = self.engine.rule_set();
        debug!(
            "Sanitizing {} with rule set '{}' ({:?}, max {} passes).",
            loggable_text(text),
            rule_set.name(),
            rule_set.mode(),
            rule_set.max_iterations()
        );

        let result = match rule_set.mode() {
            Mode::SinglePass => self.run_single_pass(text),
            Mode::Fixpoint => self.run_to_fixpoint(text, rule_set.max_iterations()),
        };

        match &result.verdict {
            Verdict::Converged { passes, .. } => {
                info!("Rule set '{}' converged after {} pass(es).", rule_set.name(), passes)
            }
            Verdict::BudgetExceeded { passes, budget, .. } => warn!(
                "Rule set '{}' exceeded its {:?} budget after {} pass(es).",
                rule_set.name(),
                budget,
                passes
            ),
            Verdict::Cyclic { cycle_length, .. } => warn!(
                "Rule set '{}' is cyclic: text repeats every {} pass(es).",
                rule_set.name(),
                cycle_length
            ),
        }
        result
    }

    fn run_single_pass(&self, text: &str) -> Sanitization {
        match self.engine.rewrite_pass(text, 1) {
            Ok(outcome) => Sanitization {
                verdict: Verdict::Converged {
                    text: outcome.text,
                    passes: 1,
                },
                trace: vec![outcome.trace],
            },
            Err(exceeded) => {
                warn!("{}", exceeded);
                Sanitization {
                    verdict: Verdict::BudgetExceeded {
                        text: text.to_string(),
                        passes: 0,
                        budget: exceeded.kind,
                    },
                    trace: Vec::new(),
                }
            }
        }
    }

    fn run_to_fixpoint(&self, text: &str, max_iterations: usize) -> Sanitization {
        let mut pass = 0usize;
        // Digest of each text produced so far -> the pass that produced it.
        let mut seen_hashes: HashMap<String, usize> = HashMap::new();
        let mut trace: Vec<PassTrace> = Vec::new();
        let mut current = text.to_string();

        let verdict = loop {
            let outcome = match self.engine.rewrite_pass(&current, trace.len() + 1) {
                Ok(outcome) => outcome,
                Err(exceeded) => {
                    warn!("{}", exceeded);
                    break Verdict::BudgetExceeded {
                        text: current,
                        passes: pass,
                        budget: exceeded.kind,
                    };
                }
            };

            let total_matches = outcome.trace.total_matches;
            let after_hash = outcome.trace.text_after_hash.clone();
            trace.push(outcome.trace);
            current = outcome.text;

            if total_matches == 0 {
                break Verdict::Converged {
                    text: current,
                    passes: pass,
                };
            }

            pass += 1;
            if pass > max_iterations {
                break Verdict::BudgetExceeded {
                    text: current,
                    passes: pass,
                    budget: BudgetKind::Iterations,
                };
            }

            if let Some(&first_seen) = seen_hashes.get(&after_hash) {
                break Verdict::Cyclic {
                    text: current,
                    passes: pass,
                    cycle_length: pass - first_seen,
                };
            }
            seen_hashes.insert(after_hash, pass);
        };

        Sanitization { verdict, trace }
    }
}
