//! Shared utilities.
//!
//! Test helpers for building scratch source trees.

#[cfg(test)]
pub mod testutil;
