//! Configuration management for `sanifix-core`.
//!
//! This module defines the serializable shape of rewrite rules and rule sets.
//! It handles YAML deserialization, the embedded default rule library, merging
//! user overrides into defaults, and validation of loaded configs.
//!
//! Compilation into runnable [`crate::RuleSet`]s lives in
//! [`crate::sanitizers::compiler`].
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::rule::{PatternKind, RuleFlags, StepBudget};
use crate::rule_set::{Mode, DEFAULT_MAX_ITERATIONS};

/// Maximum allowed length for a pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single rewrite rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Unique identifier for the rule within its rule set.
    pub name: String,
    pub description: Option<String>,
    /// How `pattern` is interpreted (`literal`, `wildcard` or `regex`).
    pub kind: PatternKind,
    pub pattern: String,
    /// Literal replacement text. Empty means deletion.
    pub replace_with: String,
    pub case_insensitive: bool,
    pub multiline: bool,
    pub dot_matches_new_line: bool,
    pub lazy: bool,
    pub global: bool,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
    /// If true, the rule is dropped unless explicitly enabled.
    pub opt_in: bool,
    pub tags: Option<Vec<String>>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            kind: PatternKind::Regex,
            pattern: String::new(),
            replace_with: String::new(),
            case_insensitive: false,
            multiline: false,
            dot_matches_new_line: false,
            lazy: false,
            global: true,
            enabled: None,
            opt_in: false,
            tags: None,
        }
    }
}

impl RuleConfig {
    pub fn flags(&self) -> RuleFlags {
        RuleFlags {
            case_insensitive: self.case_insensitive,
            multiline: self.multiline,
            dot_matches_new_line: self.dot_matches_new_line,
            lazy: self.lazy,
            global: self.global,
        }
    }
}

/// Per-rule application limits as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct StepBudgetConfig {
    pub max_matches: Option<usize>,
    pub max_millis: Option<u64>,
}

impl From<StepBudgetConfig> for StepBudget {
    fn from(config: StepBudgetConfig) -> Self {
        StepBudget {
            max_matches: config.max_matches,
            max_duration: config.max_millis.map(Duration::from_millis),
        }
    }
}

/// An ordered rule set plus its application policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleSetConfig {
    pub name: String,
    pub description: Option<String>,
    pub mode: Mode,
    pub max_iterations: usize,
    pub step_budget: StepBudgetConfig,
    pub rules: Vec<RuleConfig>,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            mode: Mode::Fixpoint,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            step_budget: StepBudgetConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl RuleSetConfig {
    /// Loads a single rule set from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rule set from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule set file {}", path.display()))?;
        let config: RuleSetConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse rule set file {}", path.display()))?;

        config.validate()?;
        info!("Loaded rule set '{}' with {} rules.", config.name, config.rules.len());
        Ok(config)
    }

    /// Filters active rules based on enable/disable lists.
    ///
    /// Disabled names always win; opt-in rules survive only when enabled by
    /// name. Rule order is preserved.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();
        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist in '{}'.", rule_name, self.name);
        }
        for rule_name in disable_set.difference(&all_rule_names) {
            warn!(
                "Rule '{}' in `disable_rules` list does not exist in '{}'.",
                rule_name, self.name
            );
        }

        self.rules.retain(|rule| {
            let name = rule.name.as_str();
            if disable_set.contains(name) || rule.enabled == Some(false) {
                return false;
            }
            !rule.opt_in || enable_set.contains(name) || rule.enabled == Some(true)
        });

        debug!("Active rules in '{}' after filtering: {}", self.name, self.rules.len());
    }

    /// Checks integrity of the rule set, collecting every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut rule_names = HashSet::new();
        let mut errors = Vec::new();

        if self.rules.is_empty() {
            errors.push(format!("Rule set '{}' has no rules.", self.name));
        }
        if self.max_iterations < 1 {
            errors.push(format!(
                "Rule set '{}' has `max_iterations` {}; it must be at least 1.",
                self.name, self.max_iterations
            ));
        }

        for rule in &self.rules {
            if rule.name.is_empty() {
                errors.push("A rule has an empty `name` field.".to_string());
            } else if !rule_names.insert(rule.name.as_str()) {
                errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
            }
            if rule.pattern.is_empty() {
                errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
            } else if rule.pattern.len() > MAX_PATTERN_LENGTH {
                errors.push(format!(
                    "Rule '{}' pattern is {} bytes; the maximum is {}.",
                    rule.name,
                    rule.pattern.len(),
                    MAX_PATTERN_LENGTH
                ));
            }
        }

        if !errors.is_empty() {
            Err(anyhow!("Rule set validation failed:\n{}", errors.join("\n")))
        } else {
            Ok(())
        }
    }
}

/// A named collection of rule sets, e.g. the built-in library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleLibrary {
    pub rule_sets: Vec<RuleSetConfig>,
}

impl RuleLibrary {
    /// Loads a library of rule sets from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rule library from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule library {}", path.display()))?;
        let library: RuleLibrary = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse rule library {}", path.display()))?;

        for rule_set in &library.rule_sets {
            rule_set.validate()?;
        }
        info!("Loaded {} rule sets from {}.", library.rule_sets.len(), path.display());
        Ok(library)
    }

    /// Loads the built-in rule sets embedded in the crate.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default rule library from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let library: RuleLibrary =
            serde_yml::from_str(default_yaml).context("Failed to parse default rule library")?;

        debug!("Loaded {} default rule sets.", library.rule_sets.len());
        Ok(library)
    }

    pub fn get(&self, name: &str) -> Option<&RuleSetConfig> {
        self.rule_sets.iter().find(|set| set.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rule_sets.iter().map(|set| set.name.as_str())
    }
}

/// User overrides for one rule set.
///
/// Unlike [`RuleSetConfig`], every policy field is optional: a field left out
/// of the user's YAML keeps the value of the rule set it is merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleSetOverride {
    pub description: Option<String>,
    pub mode: Option<Mode>,
    pub max_iterations: Option<usize>,
    pub step_budget: Option<StepBudgetConfig>,
    pub rules: Vec<RuleConfig>,
}

impl RuleSetOverride {
    /// Loads user overrides from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rule set overrides from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule set overrides {}", path.display()))?;
        serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse rule set overrides {}", path.display()))
    }
}

/// Merges user overrides over a default rule set.
///
/// User rules replace default rules of the same name in place, so the default
/// ordering is kept; new user rules are appended in their own order. Policy
/// fields (mode, iteration limit, step budget) change only when the user set
/// them.
pub fn merge_rule_sets(
    default_config: RuleSetConfig,
    user_config: Option<RuleSetOverride>,
) -> RuleSetConfig {
    debug!(
        "merge_rule_sets called. Default '{}' has {} rules.",
        default_config.name,
        default_config.rules.len()
    );

    let Some(user_cfg) = user_config else {
        return default_config;
    };

    let mut merged = default_config;
    for user_rule in user_cfg.rules {
        match merged.rules.iter_mut().find(|r| r.name == user_rule.name) {
            Some(existing) => {
                debug!("Overriding rule '{}' with user definition.", user_rule.name);
                *existing = user_rule;
            }
            None => merged.rules.push(user_rule),
        }
    }
    if let Some(mode) = user_cfg.mode {
        merged.mode = mode;
    }
    if let Some(max_iterations) = user_cfg.max_iterations {
        merged.max_iterations = max_iterations;
    }
    if let Some(step_budget) = user_cfg.step_budget {
        merged.step_budget = step_budget;
    }
    if user_cfg.description.is_some() {
        merged.description = user_cfg.description;
    }

    debug!("Final total rules after merge: {}", merged.rules.len());
    merged
}
