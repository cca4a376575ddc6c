// sanifix-core/src/trace.rs
//! Rewrite trace records and log-safe text helpers.
//!
//! Every pass produces a [`PassTrace`] with one [`RuleStep`] per rule. Texts are
//! identified by SHA-256 digests so traces can be kept and compared without
//! holding on to (possibly hostile) input.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

lazy_static! {
    /// Whether raw text may appear in debug logs. Initialized once.
    static ref TEXT_DEBUG_ALLOWED: bool = {
        std::env::var("SANIFIX_ALLOW_DEBUG_TEXT")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Hex-encoded SHA-256 of `text`.
pub fn text_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// A placeholder describing `text` without revealing it.
pub fn redact_text(text: &str) -> String {
    format!("[TEXT: {} chars]", text.chars().count())
}

pub(crate) fn loggable_text(text: &str) -> String {
    if *TEXT_DEBUG_ALLOWED {
        text.to_string()
    } else {
        redact_text(text)
    }
}

/// One rule's contribution to a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStep {
    pub rule_index: usize,
    pub rule_name: String,
    pub match_count: usize,
    pub text_before_hash: String,
    pub text_after_hash: String,
}

/// A full pass over the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassTrace {
    /// 1-based index of the pass within its run.
    pub pass: usize,
    pub steps: Vec<RuleStep>,
    pub total_matches: usize,
    pub text_before_hash: String,
    pub text_after_hash: String,
}

impl PassTrace {
    /// True when the pass left the text byte-for-byte unchanged.
    pub fn is_identity(&self) -> bool {
        self.text_before_hash == self.text_after_hash
    }
}

pub(crate) fn log_rule_step_debug(step: &RuleStep, before: &str, after: &str) {
    if step.match_count == 0 {
        return;
    }
    debug!(
        "Rule #{} '{}' matched {} time(s): '{}' -> '{}'",
        step.rule_index,
        step.rule_name,
        step.match_count,
        loggable_text(before),
        loggable_text(after)
    );
}
