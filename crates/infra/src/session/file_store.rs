//! JSON file holding the selected team, active tab and sync watermark
//!
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a crash mid-write leaves the previous session intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sprintsync_core::sync::ports::{SessionStore, SessionUpdate};
use sprintsync_domain::{Result, SessionState, SprintSyncError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct FileSessionStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<SessionState> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved session, starting fresh");
                return Ok(SessionState::default());
            }
            Err(err) => {
                return Err(SprintSyncError::Persistence(format!(
                    "Failed to read session file {}: {err}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(err) => {
                // A corrupt session only loses UI preferences and the watermark
                warn!(path = %self.path.display(), error = %err, "discarding unreadable session file");
                Ok(SessionState::default())
            }
        }
    }

    async fn write(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| SprintSyncError::Internal(format!("Failed to encode session: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SprintSyncError::Persistence(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SprintSyncError::Persistence(format!("Failed to write session: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SprintSyncError::Persistence(format!("Failed to replace session file: {e}")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<SessionState> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn update(&self, update: SessionUpdate) -> Result<SessionState> {
        let _guard = self.lock.lock().await;
        let mut state = self.read().await?;
        update(&mut state);
        self.write(&state).await?;
        Ok(state)
    }
}
