// sanifix-core/src/rule.rs
//! A single compiled rewrite rule.
//!
//! A [`Rule`] is an immutable pattern, a literal replacement, and the matching
//! flags it was built with. Applying it is pure: the same text always yields
//! the same output and match count. Matching is leftmost-first and
//! non-overlapping, the usual global-substitution semantics.
//!
//! Rules are built by [`crate::sanitizers::compiler`], which performs every
//! structural check up front, so [`Rule::apply`] can only fail because a
//! [`StepBudget`] ran out.
//!
//! License: MIT OR APACHE 2.0

use std::time::{Duration, Instant};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{BudgetKind, StepBudgetExceeded};

/// How a rule's `pattern` text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Matched verbatim.
    Literal,
    /// `*` matches any run of characters, `?` a single character, `\` escapes.
    Wildcard,
    /// Full `regex` crate syntax.
    #[default]
    Regex,
}

/// Matching flags carried by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleFlags {
    pub case_insensitive: bool,
    pub multiline: bool,
    pub dot_matches_new_line: bool,
    /// Swaps the greediness of every quantifier.
    pub lazy: bool,
    /// When false only the leftmost match is rewritten.
    pub global: bool,
}

impl Default for RuleFlags {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multiline: false,
            dot_matches_new_line: false,
            lazy: false,
            global: true,
        }
    }
}

/// Work allowance for one application of one rule.
///
/// Both limits are checked after every match inside [`Rule::apply`], and the
/// time limit once more when the scan ends, so a slow scan that finds nothing
/// still reports its overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepBudget {
    pub max_matches: Option<usize>,
    pub max_duration: Option<Duration>,
}

impl StepBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    fn check(
        &self,
        rule: &str,
        matches: usize,
        started: Instant,
    ) -> Result<(), StepBudgetExceeded> {
        if let Some(max) = self.max_matches {
            if matches > max {
                return Err(StepBudgetExceeded {
                    rule: rule.to_string(),
                    kind: BudgetKind::RuleMatches,
                    matches,
                });
            }
        }
        if let Some(limit) = self.max_duration {
            if started.elapsed() > limit {
                return Err(StepBudgetExceeded {
                    rule: rule.to_string(),
                    kind: BudgetKind::RuleTime,
                    matches,
                });
            }
        }
        Ok(())
    }
}

/// The outcome of applying one rule once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub text: String,
    pub match_count: usize,
}

/// A compiled, immutable rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) kind: PatternKind,
    pub(crate) pattern: String,
    pub(crate) regex: Regex,
    pub(crate) replacement: String,
    pub(crate) flags: RuleFlags,
    pub(crate) budget: StepBudget,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The pattern text as configured, before translation to a regex.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled regex source (for literal and wildcard rules, the translation).
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn flags(&self) -> RuleFlags {
        self.flags
    }

    pub fn budget(&self) -> StepBudget {
        self.budget
    }

    /// Returns a copy of this rule with a different step budget.
    pub fn with_budget(mut self, budget: StepBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Rewrites every non-empty match in `text` (only the first when the rule is
    /// not global) with the literal replacement.
    ///
    /// A `match_count` of zero means `text` came back unchanged.
    pub fn apply(&self, text: &str) -> Result<Application, StepBudgetExceeded> {
        let started = Instant::now();
        let mut output = String::with_capacity(text.len());
        let mut last_end = 0usize;
        let mut match_count = 0usize;

        for m in self.regex.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            match_count += 1;
            self.budget.check(&self.name, match_count, started)?;
            output.push_str(&text[last_end..m.start()]);
            output.push_str(&self.replacement);
            last_end = m.end();
            if !self.flags.global {
                break;
            }
        }
        self.budget.check(&self.name, match_count, started)?;

        if match_count == 0 {
            return Ok(Application {
                text: text.to_string(),
                match_count,
            });
        }
        output.push_str(&text[last_end..]);
        Ok(Application {
            text: output,
            match_count,
        })
    }

    /// Counts the non-empty matches in `text` without rewriting anything.
    pub fn count_matches(&self, text: &str) -> usize {
        self.regex
            .find_iter(text)
            .filter(|m| m.start() != m.end())
            .count()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.count_matches(text) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizers::compiler::compile_rule;
    use crate::config::RuleConfig;

    fn regex_rule(name: &str, pattern: &str, replace_with: &str) -> Rule {
        let config = RuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            replace_with: replace_with.to_string(),
            ..Default::default()
        };
        compile_rule(&config, StepBudget::unlimited()).unwrap()
    }

    #[test]
    fn test_apply_deletes_all_matches() {
        let rule = regex_rule("script", "</?script>", "");
        let applied = rule.apply("<scr<script>ipt>alert(1)</script>").unwrap();
        assert_eq!(applied.text, "<script>alert(1)");
        assert_eq!(applied.match_count, 2);
    }

    #[test]
    fn test_apply_without_match_is_identity() {
        let rule = regex_rule("dots", r"\.\.", "");
        let applied = rule.apply("plain/path").unwrap();
        assert_eq!(applied.text, "plain/path");
        assert_eq!(applied.match_count, 0);
    }

    #[test]
    fn test_apply_is_leftmost_and_non_overlapping() {
        let rule = regex_rule("dots", r"\.\.", "");
        let applied = rule.apply(".....").unwrap();
        assert_eq!(applied.text, ".");
        assert_eq!(applied.match_count, 2);
    }

    #[test]
    fn test_replacement_is_literal() {
        let rule = regex_rule("wrap", "(a)", "$1-");
        let applied = rule.apply("ba").unwrap();
        assert_eq!(applied.text, "b$1-");
    }

    #[test]
    fn test_non_global_rewrites_first_match_only() {
        let config = RuleConfig {
            name: "first".to_string(),
            pattern: "x".to_string(),
            replace_with: "y".to_string(),
            global: false,
            ..Default::default()
        };
        let rule = compile_rule(&config, StepBudget::unlimited()).unwrap();
        let applied = rule.apply("xxx").unwrap();
        assert_eq!(applied.text, "yxx");
        assert_eq!(applied.match_count, 1);
        assert_eq!(rule.count_matches("xxx"), 3);
    }

    #[test]
    fn test_match_budget_is_checked_inside_apply() {
        let rule = regex_rule("a", "a", "").with_budget(StepBudget {
            max_matches: Some(3),
            max_duration: None,
        });
        assert!(rule.apply("aaa").is_ok());
        let err = rule.apply("aaaa").unwrap_err();
        assert_eq!(err.kind, BudgetKind::RuleMatches);
        assert_eq!(err.rule, "a");
        assert_eq!(err.matches, 4);
    }

    #[test]
    fn test_zero_duration_budget_trips_on_first_match() {
        let rule = regex_rule("a", "a", "").with_budget(StepBudget {
            max_matches: None,
            max_duration: Some(Duration::ZERO),
        });
        let err = rule.apply(&"a".repeat(10_000)).unwrap_err();
        assert_eq!(err.kind, BudgetKind::RuleTime);
        assert_eq!(err.matches, 1);
    }

    #[test]
    fn test_time_budget_applies_to_scan_without_matches() {
        let rule = regex_rule("slow", r"(\w+\s+){3,}zzz\d{5}", "").with_budget(StepBudget {
            max_matches: None,
            max_duration: Some(Duration::ZERO),
        });
        let err = rule.apply(&"héllo wörld ".repeat(10_000)).unwrap_err();
        assert_eq!(err.kind, BudgetKind::RuleTime);
        assert_eq!(err.matches, 0);

        let unbounded = regex_rule("slow", r"(\w+\s+){3,}zzz\d{5}", "");
        assert!(unbounded.apply(&"héllo wörld ".repeat(10_000)).is_ok());
    }
}
