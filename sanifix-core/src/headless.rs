// sanifix-core/src/headless.rs
//! Convenience wrappers for one-shot, non-interactive use.
//!
//! These helpers compile configuration, run the controller and build the
//! report in a single call.

use anyhow::{Context, Result};

use crate::config::{RuleLibrary, RuleSetConfig};
use crate::diagnostics::Report;
use crate::engine::RewriteEngine;
use crate::engines::sequential::SequentialEngine;
use crate::fixpoint::{FixpointController, Sanitization};
use crate::rule_set::RuleSet;

/// Runs an already compiled rule set over `text`.
pub fn sanitize(rule_set: &RuleSet, text: &str) -> Sanitization {
    let engine = SequentialEngine::new(rule_set.clone());
    FixpointController::new(&engine).run(text)
}

/// Runs an already compiled rule set over `text` and builds its report.
pub fn sanitize_to_report(rule_set: &RuleSet, text: &str) -> Report {
    Report::new(rule_set, sanitize(rule_set, text))
}

/// Compiles `config`, sanitizes `content`, and returns the full report.
pub fn headless_sanitize_string(config: &RuleSetConfig, content: &str) -> Result<Report> {
    let engine = SequentialEngine::from_config(config)?;
    let run = FixpointController::new(&engine).run(content);
    Ok(Report::new(engine.rule_set(), run))
}

/// Sanitizes `content` with one of the built-in rule sets.
pub fn headless_sanitize_with_default(rule_set_name: &str, content: &str) -> Result<Report> {
    let library = RuleLibrary::load_default()?;
    let config = library
        .get(rule_set_name)
        .with_context(|| format!("Rule set '{}' not found in the default library", rule_set_name))?;
    headless_sanitize_string(config, content)
}
