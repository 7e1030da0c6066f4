//! # SprintSync API
//!
//! Application layer: composition root and the entry point.
//!
//! This crate contains:
//! - Application context (dependency injection, selectors and mutators)
//! - Logging setup and command timing helpers
//! - Main entry point
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::*;
