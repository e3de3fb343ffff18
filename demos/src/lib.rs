//! Shared wiring for the prospect demo binary.
#![warn(missing_docs)]

/// Source selection for demos.
pub mod common;
