//! # SprintSync Domain
//!
//! Business domain types and models for SprintSync.
//!
//! This crate contains:
//! - Calendar, schedule, roster and capacity data types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - Only depends on the `foundation` tier of `sprintsync-common`
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::remote::flatten_remote;
pub use types::*;
