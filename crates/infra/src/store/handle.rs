//! Message-passing front end of the schedule store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sprintsync_core::schedule::ports::ScheduleSink;
use sprintsync_core::{MergeReport, ScheduleSnapshot};
use sprintsync_domain::{
    MemberId, Result, ScheduleCell, ScheduleEntry, ScheduleKey, SprintSyncError, TeamId,
};
use tokio::sync::{mpsc, oneshot, watch};

/// Messages handled by the coordinator task
pub(crate) enum StoreCommand {
    Update { entry: ScheduleEntry, ack: oneshot::Sender<Option<ScheduleCell>> },
    Retry { key: Option<ScheduleKey>, ack: oneshot::Sender<usize> },
    ApplyRemote { entries: Vec<ScheduleEntry>, reply: oneshot::Sender<MergeReport> },
    ReplaceAuthoritative { entries: Vec<ScheduleEntry>, reply: oneshot::Sender<MergeReport> },
    SetRoster { teams: HashMap<MemberId, TeamId>, ack: oneshot::Sender<()> },
    Shutdown { ack: oneshot::Sender<()> },
}

fn stopped() -> SprintSyncError {
    SprintSyncError::Internal("schedule store is not running".to_string())
}

/// Cloneable handle to a running schedule store
#[derive(Clone)]
pub struct ScheduleStoreHandle {
    tx: mpsc::Sender<StoreCommand>,
    snapshots: watch::Receiver<Arc<ScheduleSnapshot>>,
}

impl ScheduleStoreHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<StoreCommand>,
        snapshots: watch::Receiver<Arc<ScheduleSnapshot>>,
    ) -> Self {
        Self { tx, snapshots }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> StoreCommand) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).await.map_err(|_| stopped())?;
        reply_rx.await.map_err(|_| stopped())
    }

    /// Apply an edit optimistically and schedule its debounced commit.
    ///
    /// Resolves once the edit is visible in [`Self::snapshot`]; the remote
    /// write happens later.
    pub async fn update(&self, entry: ScheduleEntry) -> Result<ScheduleCell> {
        let key = entry.key();
        self.request(|ack| StoreCommand::Update { entry, ack })
            .await?
            .ok_or_else(|| SprintSyncError::Internal(format!("edit for {key:?} was not applied")))
    }

    /// Re-submit one failed entry; `false` when the key was not failed
    pub async fn retry(&self, key: ScheduleKey) -> Result<bool> {
        Ok(self.request(|ack| StoreCommand::Retry { key: Some(key), ack }).await? > 0)
    }

    /// Re-submit every failed entry; returns how many were re-queued
    pub async fn retry_all(&self) -> Result<usize> {
        self.request(|ack| StoreCommand::Retry { key: None, ack }).await
    }

    /// Member → team mapping used to scope cache invalidation
    pub async fn set_roster(&self, teams: HashMap<MemberId, TeamId>) -> Result<()> {
        self.request(|ack| StoreCommand::SetRoster { teams, ack }).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<ScheduleSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScheduleSnapshot>> {
        self.snapshots.clone()
    }

    /// `false` once the coordinator has stopped accepting commands
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Flush queued edits, wait for in-flight commits, then stop the task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|ack| StoreCommand::Shutdown { ack }).await
    }
}

#[async_trait]
impl ScheduleSink for ScheduleStoreHandle {
    async fn apply_remote(&self, entries: Vec<ScheduleEntry>) -> Result<MergeReport> {
        self.request(|reply| StoreCommand::ApplyRemote { entries, reply }).await
    }

    async fn replace_authoritative(&self, entries: Vec<ScheduleEntry>) -> Result<MergeReport> {
        self.request(|reply| StoreCommand::ReplaceAuthoritative { entries, reply }).await
    }
}
