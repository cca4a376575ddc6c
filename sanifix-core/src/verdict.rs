// sanifix-core/src/verdict.rs
//! The terminal outcome of one sanitization call.

use serde::{Deserialize, Serialize};

pub use crate::errors::BudgetKind;

/// Serialized form of a verdict's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Converged,
    BudgetExceeded,
    Cyclic,
}

/// How a run ended. Created once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No rule matches `text` any more (or, in single-pass mode, the one pass
    /// finished).
    Converged { text: String, passes: usize },
    /// A pass limit or a per-rule step budget ran out.
    BudgetExceeded {
        text: String,
        passes: usize,
        budget: BudgetKind,
    },
    /// The text returned to a form already seen `cycle_length` passes earlier.
    Cyclic {
        text: String,
        passes: usize,
        cycle_length: usize,
    },
}

impl Verdict {
    pub fn status(&self) -> Status {
        match self {
            Verdict::Converged { .. } => Status::Converged,
            Verdict::BudgetExceeded { .. } => Status::BudgetExceeded,
            Verdict::Cyclic { .. } => Status::Cyclic,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Verdict::Converged { text, .. }
            | Verdict::BudgetExceeded { text, .. }
            | Verdict::Cyclic { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Verdict::Converged { text, .. }
            | Verdict::BudgetExceeded { text, .. }
            | Verdict::Cyclic { text, .. } => text,
        }
    }

    pub fn passes(&self) -> usize {
        match self {
            Verdict::Converged { passes, .. }
            | Verdict::BudgetExceeded { passes, .. }
            | Verdict::Cyclic { passes, .. } => *passes,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Verdict::Converged { .. })
    }

    pub fn cycle_length(&self) -> Option<usize> {
        match self {
            Verdict::Cyclic { cycle_length, .. } => Some(*cycle_length),
            _ => None,
        }
    }

    pub fn budget(&self) -> Option<BudgetKind> {
        match self {
            Verdict::BudgetExceeded { budget, .. } => Some(*budget),
            _ => None,
        }
    }
}
