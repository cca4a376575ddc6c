// sanifix-core/src/lib.rs
//! # Sanifix Core Library
//!
//! `sanifix-core` is a sanitization engine for untrusted text. It applies an
//! ordered set of pattern rewrite rules and, unlike a one-shot `replace`,
//! keeps applying them until no rule can match. That matters because removing
//! one occurrence of a dangerous substring can expose another:
//! `<scr<script>ipt>` becomes `<script>` after a single deletion pass.
//!
//! The library is pure and stateless. Every call owns its own trace, so
//! independent calls can run in parallel without coordination.
//!
//! ## Modules
//!
//! * `config`: serde/YAML shapes for rules and rule sets, the built-in library, merging.
//! * `rule`: a compiled rule and its single application (`Rule::apply`).
//! * `sanitizers`: compilation of configuration into rules, with all structural checks.
//! * `rule_set`: an ordered collection of rules plus `Mode` and iteration limit.
//! * `engine`: the `RewriteEngine` trait (exactly one pass per call).
//! * `engines`: concrete engines, currently `SequentialEngine`.
//! * `fixpoint`: the controller that repeats passes and detects cycles and budget exhaustion.
//! * `verdict`: the terminal states of a run.
//! * `diagnostics`: the serializable `Report`, including residual matches.
//! * `probes` / `classifier`: adversarial probes and the rule-set safety classifier.
//! * `headless`: one-shot helpers.
//! * `trace`: per-pass trace records and text digests.
//! * `errors`: error types.
//!
//! ## Usage Example
//!
//! ```rust
//! use sanifix_core::{headless_sanitize_string, Mode, RuleConfig, RuleSetConfig, Status};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = RuleSetConfig {
//!         name: "script".to_string(),
//!         mode: Mode::Fixpoint,
//!         rules: vec![RuleConfig {
//!             name: "script_tag".to_string(),
//!             pattern: "</?script>".to_string(),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     };
//!
//!     let report = headless_sanitize_string(&config, "<scr<script>ipt>alert(1)</script>")?;
//!     assert_eq!(report.status, Status::Converged);
//!     assert_eq!(report.text, "alert(1)");
//!     assert_eq!(report.matches_per_pass, vec![2, 1, 0]);
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems (empty rule set, `max_iterations < 1`, malformed or
//! empty-matching patterns) are [`SanifixError`]s raised before any pass runs.
//! Budget exhaustion and cycles are not errors: they are [`Verdict`]s.
//! File loading uses `anyhow::Result` with context.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod fixpoint;
pub mod headless;
pub mod probes;
pub mod rule;
pub mod rule_set;
pub mod sanitizers;
pub mod trace;
pub mod verdict;

/// Re-exports the configuration types and helpers.
pub use config::{
    merge_rule_sets,
    RuleConfig,
    RuleLibrary,
    RuleSetConfig,
    RuleSetOverride,
    StepBudgetConfig,
    MAX_PATTERN_LENGTH,
};

pub use errors::{BudgetKind, SanifixError, StepBudgetExceeded};

pub use rule::{Application, PatternKind, Rule, RuleFlags, StepBudget};
pub use rule_set::{Mode, RuleSet, DEFAULT_MAX_ITERATIONS};
pub use sanitizers::compiler::{compile_rule, compile_rule_set};

pub use engine::{PassOutcome, RewriteEngine};
pub use engines::sequential::SequentialEngine;

pub use fixpoint::{FixpointController, Sanitization};
pub use verdict::{Status, Verdict};
pub use diagnostics::{Report, Residual};
pub use trace::{PassTrace, RuleStep};

pub use classifier::{classify, classify_with_probes, Classification, Counterexample, Safety};

/// Re-exports one-shot helpers for non-interactive use.
pub use headless::{
    headless_sanitize_string,
    headless_sanitize_with_default,
    sanitize,
    sanitize_to_report,
};
