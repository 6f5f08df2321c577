//! # Empire Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Worlds drawn as ASCII art, with units placed by symbol
//! - Scripted combat resolvers
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
