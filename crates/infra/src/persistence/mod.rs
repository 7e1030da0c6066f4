//! Adapters for the remote schedule store

pub mod memory;

pub use memory::{InMemoryPersistence, RecordedWrite};
