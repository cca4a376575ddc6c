//! Rule compilation.
//!
//! This module turns rule configuration into compiled, immutable rules: literal
//! and wildcard patterns are translated to regex syntax, flags are applied, and
//! every pattern is checked for problems that would otherwise surface while
//! rewriting untrusted text.

pub mod compiler;
