// sanifix-core/src/diagnostics.rs
//! Diagnostics reporter: turns a run into a serializable report.
//!
//! Besides the verdict itself, the report re-checks the final text against
//! every rule of the set. A converged fixpoint run always comes back
//! `pattern_free`; a single-pass run may not, and the `residual` list says which
//! rule would still fire and how often.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fixpoint::Sanitization;
use crate::rule_set::RuleSet;
use crate::trace::PassTrace;
use crate::verdict::{BudgetKind, Status, Verdict};

/// Matches of one rule still present in the final text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residual {
    pub rule_name: String,
    pub matches: usize,
}

/// The externally visible result of a sanitization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub status: Status,
    pub text: String,
    pub passes: usize,
    pub matches_per_pass: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetKind>,
    pub residual: Vec<Residual>,
    pub pattern_free: bool,
    #[serde(default)]
    pub trace: Vec<PassTrace>,
}

/// Lists every rule of `rule_set` that still matches `text`.
pub fn residual_matches(rule_set: &RuleSet, text: &str) -> Vec<Residual> {
    rule_set
        .rules()
        .iter()
        .filter_map(|rule| {
            let matches = rule.count_matches(text);
            (matches > 0).then(|| Residual {
                rule_name: rule.name().to_string(),
                matches,
            })
        })
        .collect()
}

impl Report {
    pub fn new(rule_set: &RuleSet, sanitization: Sanitization) -> Self {
        let matches_per_pass = sanitization.matches_per_pass();
        let Sanitization { verdict, trace } = sanitization;
        let residual = residual_matches(rule_set, verdict.text());
        let status = verdict.status();
        let passes = verdict.passes();
        let cycle_length = verdict.cycle_length();
        let budget = verdict.budget();

        Self {
            status,
            text: verdict.into_text(),
            passes,
            matches_per_pass,
            cycle_length,
            budget,
            pattern_free: residual.is_empty(),
            residual,
            trace,
        }
    }

    /// True only for a converged run whose output no rule can match.
    pub fn is_safe(&self) -> bool {
        self.status == Status::Converged && self.pattern_free
    }

    /// Rebuilds the verdict this report was made from.
    pub fn verdict(&self) -> Verdict {
        let text = self.text.clone();
        let passes = self.passes;
        match self.status {
            Status::Converged => Verdict::Converged { text, passes },
            Status::BudgetExceeded => Verdict::BudgetExceeded {
                text,
                passes,
                budget: self.budget.unwrap_or(BudgetKind::Iterations),
            },
            Status::Cyclic => Verdict::Cyclic {
                text,
                passes,
                cycle_length: self.cycle_length.unwrap_or_default(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize sanitization report")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize sanitization report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuleConfig, RuleSetConfig};
    use crate::engines::sequential::SequentialEngine;
    use crate::engine::RewriteEngine;
    use crate::fixpoint::FixpointController;
    use crate::rule_set::Mode;

    fn comment_engine(mode: Mode) -> SequentialEngine {
        SequentialEngine::from_config(&RuleSetConfig {
            name: "comments".to_string(),
            mode,
            rules: vec![RuleConfig {
                name: "comment_delimiter".to_string(),
                pattern: "<!--|--!?>".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap()
    }

    fn report(engine: &SequentialEngine, input: &str) -> Report {
        let run = FixpointController::new(engine).run(input);
        Report::new(engine.rule_set(), run)
    }

    #[test]
    fn test_single_pass_report_lists_residual() {
        let engine = comment_engine(Mode::SinglePass);
        let report = report(&engine, "<!-<!---->->");
        assert_eq!(report.status, Status::Converged);
        assert_eq!(report.text, "<!-->");
        assert!(!report.pattern_free);
        assert!(!report.is_safe());
        assert_eq!(
            report.residual,
            vec![Residual { rule_name: "comment_delimiter".to_string(), matches: 1 }]
        );
    }

    #[test]
    fn test_fixpoint_report_is_pattern_free() {
        let engine = comment_engine(Mode::Fixpoint);
        let report = report(&engine, "<!-<!---->->");
        assert_eq!(report.text, ">");
        assert_eq!(report.passes, 2);
        assert_eq!(report.matches_per_pass, vec![2, 1, 0]);
        assert!(report.is_safe());
        assert_eq!(report.verdict(), Verdict::Converged { text: ">".to_string(), passes: 2 });
    }

    #[test]
    fn test_json_shape() {
        let engine = comment_engine(Mode::Fixpoint);
        let json = report(&engine, "a<!--b-->c").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "converged");
        assert_eq!(value["text"], "abc");
        assert_eq!(value["passes"], 1);
        assert_eq!(value["matches_per_pass"], serde_json::json!([2, 0]));
        assert!(value.get("cycle_length").is_none());
        assert_eq!(value["pattern_free"], true);
    }

    #[test]
    fn test_pretty_json_round_trips_a_residual_report() {
        let engine = comment_engine(Mode::SinglePass);
        let report = report(&engine, "<!-<!---->->");
        let pretty = report.to_json_pretty().unwrap();
        assert!(pretty.contains('\n'));
        let parsed: Report = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.residual[0].rule_name, "comment_delimiter");
    }
}
