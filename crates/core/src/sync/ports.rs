//! Port interfaces for sync operations

use async_trait::async_trait;
use sprintsync_domain::{Result, SessionState};

/// Mutation applied to the persisted session in one read-modify-write step
pub type SessionUpdate = Box<dyn FnOnce(&mut SessionState) + Send>;

/// Storage for the small session record that survives restarts
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session, or defaults when nothing was saved yet
    async fn load(&self) -> Result<SessionState>;

    /// Apply `update` atomically and return the stored result
    async fn update(&self, update: SessionUpdate) -> Result<SessionState>;
}
