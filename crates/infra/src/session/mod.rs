//! Persistence of the session record

pub mod file_store;

pub use file_store::FileSessionStore;
