//! compiler.rs - Turns rule configuration into runnable rules.
//!
//! Every structural problem a rule can have is caught here, at construction
//! time: empty or oversized patterns, syntax the linear-time matcher cannot
//! express (look-around, back-references), and patterns that can match the
//! empty string. Once a [`RuleSet`] exists, applying it can only fail because
//! a step budget ran out.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use log::{debug, warn};
use regex::RegexBuilder;

use crate::config::{RuleConfig, RuleSetConfig, MAX_PATTERN_LENGTH};
use crate::errors::SanifixError;
use crate::rule::{PatternKind, Rule, RuleFlags, StepBudget};
use crate::rule_set::RuleSet;

/// Upper bound for the compiled program and its lazy DFA cache.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Translates a wildcard pattern into regex syntax.
///
/// `*` matches any run of characters, `?` exactly one, and `\` makes the next
/// character literal. Everything else is escaped.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("(?s:.*)"),
            '?' => out.push_str("(?s:.)"),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4]))),
                None => out.push_str(r"\\"),
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

fn regex_source(kind: PatternKind, pattern: &str) -> String {
    match kind {
        PatternKind::Literal => regex::escape(pattern),
        PatternKind::Wildcard => wildcard_to_regex(pattern),
        PatternKind::Regex => pattern.to_string(),
    }
}

/// Parses `source` with the same flags the matcher uses and reports whether
/// its shortest possible match is empty.
fn can_match_empty(source: &str, flags: RuleFlags) -> Result<bool, String> {
    let mut parser = regex_syntax::ParserBuilder::new()
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multiline)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .swap_greed(flags.lazy)
        .build();
    let hir = parser.parse(source).map_err(|e| e.to_string())?;
    Ok(matches!(hir.properties().minimum_len(), Some(0)))
}

/// Compiles one rule.
pub fn compile_rule(config: &RuleConfig, budget: StepBudget) -> Result<Rule, SanifixError> {
    let name = config.name.clone();
    if config.pattern.is_empty() {
        return Err(SanifixError::EmptyPattern(name));
    }
    if config.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(SanifixError::PatternLengthExceeded(
            name,
            config.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }

    let flags = config.flags();
    let source = regex_source(config.kind, &config.pattern);
    debug!(
        target: "sanifix_core::compiler",
        "Compiling rule '{}' ({:?}) as '{}'", name, config.kind, source
    );

    let regex = RegexBuilder::new(&source)
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multiline)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .swap_greed(flags.lazy)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| SanifixError::RuleCompilationError(name.clone(), e))?;

    // The regex compiled, so the same source parses; treat a failure as the
    // conservative answer.
    if can_match_empty(&source, flags).unwrap_or(true) {
        return Err(SanifixError::MatchesEmptyString(name));
    }

    Ok(Rule {
        name,
        kind: config.kind,
        pattern: config.pattern.clone(),
        regex,
        replacement: config.replace_with.clone(),
        flags,
        budget,
    })
}

/// Compiles a full rule set, reporting every failing rule at once.
///
/// Rules explicitly disabled with `enabled: false` are skipped. Rule names
/// must be unique among the enabled rules.
pub fn compile_rule_set(config: &RuleSetConfig) -> Result<RuleSet, SanifixError> {
    debug!(
        "Starting compilation of rule set '{}' ({} rules).",
        config.name,
        config.rules.len()
    );

    let budget = StepBudget::from(config.step_budget);
    let mut rules = Vec::with_capacity(config.rules.len());
    let mut compilation_errors = Vec::new();

    let mut rule_names = HashSet::new();

    for rule_config in &config.rules {
        if rule_config.enabled == Some(false) {
            warn!("Skipping rule '{}' because it is disabled.", rule_config.name);
            continue;
        }
        if !rule_names.insert(rule_config.name.as_str()) {
            compilation_errors.push(SanifixError::DuplicateRuleName(
                config.name.clone(),
                rule_config.name.clone(),
            ));
            continue;
        }
        match compile_rule(rule_config, budget) {
            Ok(rule) => rules.push(rule),
            Err(e) => compilation_errors.push(e),
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(SanifixError::InvalidRules(compilation_errors.len(), error_message));
    }

    let rule_set = RuleSet::new(config.name.clone(), rules)?
        .with_mode(config.mode)
        .with_max_iterations(config.max_iterations)?;
    debug!(
        "Finished compiling rule set '{}'. Total compiled: {}.",
        rule_set.name(),
        rule_set.rules().len()
    );
    Ok(rule_set)
}
