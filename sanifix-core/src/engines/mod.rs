// sanifix-core/src/engines/mod.rs
//! Concrete implementations of the `RewriteEngine` trait.
//!
//! Each engine lives in its own file and is declared here.

pub mod sequential;
