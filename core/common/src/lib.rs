//! Common utilities shared across Lockleaf crates.
//!
//! This crate provides the foundational error type used throughout the
//! workspace, ensuring consistent error semantics across modules.

pub mod error;

pub use error::{Error, Result};
