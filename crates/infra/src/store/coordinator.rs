//! Coordinator task owning the schedule state
//!
//! The loop waits on three sources: commands from handles, outcomes of
//! spawned commit tasks, and the earliest debounce deadline. At most one
//! commit per key is in flight; an edit landing during a commit is sent
//! after that commit resolves so the remote store never sees values out of
//! order.
//!
//! Cache invalidation trails publication: a changed snapshot is sent first
//! and only then are the affected team tags dropped, so a reader that
//! recomputes after an invalidation always sees the new values.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use sprintsync_common::time::{Clock, SystemClock};
use sprintsync_core::schedule::ports::PersistenceService;
use sprintsync_core::schedule::DebounceQueue;
use sprintsync_core::{CapacityCache, ScheduleSnapshot, ScheduleState};
use sprintsync_domain::constants::{STORE_COMMAND_BUFFER, TAG_COMPANY};
use sprintsync_domain::{MemberId, Result, ScheduleConfig, ScheduleKey, SprintSyncError, TeamId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::handle::{ScheduleStoreHandle, StoreCommand};

/// Timing knobs for the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Quiet period after the last edit before a key is committed
    pub debounce: Duration,
    /// Upper bound on one remote write
    pub commit_timeout: Duration,
    pub command_buffer: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

impl From<&ScheduleConfig> for StoreSettings {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            debounce: config.debounce(),
            commit_timeout: config.commit_timeout(),
            command_buffer: STORE_COMMAND_BUFFER,
        }
    }
}

/// Result of one remote write, posted back by the commit task
struct CommitOutcome {
    key: ScheduleKey,
    revision: u64,
    result: Result<()>,
}

/// Spawns the coordinator task
pub struct ScheduleStore;

impl ScheduleStore {
    /// Start a store writing through `persistence` and invalidating `cache`.
    pub fn spawn(
        persistence: Arc<dyn PersistenceService>,
        cache: Arc<CapacityCache>,
        settings: StoreSettings,
    ) -> (ScheduleStoreHandle, JoinHandle<()>) {
        Self::spawn_with_clock(persistence, cache, settings, Arc::new(SystemClock))
    }

    /// Same as [`Self::spawn`] with an explicit clock for edit timestamps
    pub fn spawn_with_clock(
        persistence: Arc<dyn PersistenceService>,
        cache: Arc<CapacityCache>,
        settings: StoreSettings,
        clock: Arc<dyn Clock>,
    ) -> (ScheduleStoreHandle, JoinHandle<()>) {
        let (coordinator, handle) = Coordinator::new(persistence, cache, settings, clock);
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }
}

struct Coordinator {
    state: ScheduleState,
    debounce: DebounceQueue<ScheduleKey>,
    /// Key → revision of the commit currently awaiting the remote store
    in_flight: HashMap<ScheduleKey, u64>,
    /// Keys that became due while their previous commit was in flight
    resend: HashSet<ScheduleKey>,
    roster: HashMap<MemberId, TeamId>,
    /// Members whose cached aggregates drop once the next snapshot is out
    stale_members: BTreeSet<MemberId>,
    published_version: u64,
    persistence: Arc<dyn PersistenceService>,
    cache: Arc<CapacityCache>,
    clock: Arc<dyn Clock>,
    commit_timeout: Duration,
    commit_tx: mpsc::UnboundedSender<CommitOutcome>,
    commit_rx: mpsc::UnboundedReceiver<CommitOutcome>,
    commands: mpsc::Receiver<StoreCommand>,
    snapshots: watch::Sender<Arc<ScheduleSnapshot>>,
    shutdown_ack: Option<oneshot::Sender<()>>,
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Coordinator {
    fn new(
        persistence: Arc<dyn PersistenceService>,
        cache: Arc<CapacityCache>,
        settings: StoreSettings,
        clock: Arc<dyn Clock>,
    ) -> (Self, ScheduleStoreHandle) {
        let (tx, rx) = mpsc::channel(settings.command_buffer.max(1));
        let (commit_tx, commit_rx) = mpsc::unbounded_channel();
        let state = ScheduleState::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(state.snapshot()));

        let coordinator = Self {
            state,
            debounce: DebounceQueue::new(settings.debounce),
            in_flight: HashMap::new(),
            resend: HashSet::new(),
            roster: HashMap::new(),
            stale_members: BTreeSet::new(),
            published_version: 0,
            persistence,
            cache,
            clock,
            commit_timeout: settings.commit_timeout,
            commit_tx,
            commit_rx,
            commands: rx,
            snapshots: snapshot_tx,
            shutdown_ack: None,
        };
        (coordinator, ScheduleStoreHandle::new(tx, snapshot_rx))
    }

    async fn run(mut self) {
        debug!("schedule store coordinator started");
        loop {
            if self.shutdown_ack.is_some() && self.in_flight.is_empty() {
                break;
            }

            let deadline = self.debounce.next_deadline().map(Instant::from_std);
            tokio::select! {
                command = self.commands.recv(), if self.shutdown_ack.is_none() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("all store handles dropped");
                        self.begin_shutdown(None);
                    }
                },
                Some(outcome) = self.commit_rx.recv() => self.finish_commit(outcome),
                () = sleep_until_deadline(deadline) => self.flush_due(),
            }
            self.publish();
        }

        if let Some(ack) = self.shutdown_ack.take() {
            let _ = ack.send(());
        }
        info!(failed = self.state.failed_keys().len(), "schedule store stopped");
    }

    fn handle(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::Update { entry, ack } => {
                let key = entry.key();
                let revision = self.state.apply_optimistic(entry, self.clock.utc_now());
                self.debounce.touch(key, Instant::now().into_std());
                self.stale_members.insert(key.member_id);
                debug!(member_id = key.member_id, date = %key.date, revision, "optimistic edit applied");
                self.publish();
                let _ = ack.send(self.state.effective(&key));
            }
            StoreCommand::Retry { key, ack } => {
                let keys = match key {
                    Some(key) => vec![key],
                    None => self.state.failed_keys(),
                };
                let mut retried = 0;
                for key in keys {
                    if self.state.mark_retry(&key).is_some() {
                        retried += 1;
                        self.start_commit(key);
                    }
                }
                if retried > 0 {
                    info!(retried, "failed schedule entries resubmitted");
                }
                let _ = ack.send(retried);
            }
            StoreCommand::ApplyRemote { entries, reply } => {
                let report = self.state.merge_remote(entries);
                self.stale_members.extend(report.affected_members());
                self.publish();
                let _ = reply.send(report);
            }
            StoreCommand::ReplaceAuthoritative { entries, reply } => {
                let report = self.state.replace_authoritative(entries);
                self.stale_members.extend(report.affected_members());
                self.publish();
                let _ = reply.send(report);
            }
            StoreCommand::SetRoster { teams, ack } => {
                self.roster = teams;
                let _ = ack.send(());
            }
            StoreCommand::Shutdown { ack } => self.begin_shutdown(Some(ack)),
        }
    }

    /// Send everything still debounced and stop accepting commands.
    fn begin_shutdown(&mut self, ack: Option<oneshot::Sender<()>>) {
        let queued = self.debounce.take_due(Instant::now().into_std() + self.debounce.window());
        debug!(queued = queued.len(), in_flight = self.in_flight.len(), "schedule store shutting down");
        for key in queued {
            self.start_commit(key);
        }
        self.commands.close();
        // A dropped-handles shutdown has no one to acknowledge
        self.shutdown_ack = Some(ack.unwrap_or_else(|| oneshot::channel().0));
    }

    fn flush_due(&mut self) {
        for key in self.debounce.take_due(Instant::now().into_std()) {
            self.start_commit(key);
        }
    }

    fn start_commit(&mut self, key: ScheduleKey) {
        if self.in_flight.contains_key(&key) {
            self.resend.insert(key);
            return;
        }
        let Some(local) = self.state.pending_commit(&key) else {
            return;
        };

        let revision = local.revision;
        let entry = local.entry.clone();
        self.in_flight.insert(key, revision);

        let persistence = Arc::clone(&self.persistence);
        let outcomes = self.commit_tx.clone();
        let timeout = self.commit_timeout;
        tokio::spawn(async move {
            let write = persistence.update_schedule_entry(entry.member_id, entry.date, entry.value, entry.reason);
            let result = match tokio::time::timeout(timeout, write).await {
                Ok(result) => result,
                Err(_) => Err(SprintSyncError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))),
            };
            let _ = outcomes.send(CommitOutcome { key, revision, result });
        });
    }

    fn finish_commit(&mut self, outcome: CommitOutcome) {
        let CommitOutcome { key, revision, result } = outcome;
        self.in_flight.remove(&key);

        let applied = match result {
            Ok(()) => {
                let applied = self.state.commit_succeeded(&key, revision);
                debug!(member_id = key.member_id, date = %key.date, revision, applied, "schedule commit succeeded");
                applied
            }
            Err(err) => {
                let message = match &err {
                    SprintSyncError::Timeout(_) => err.to_string(),
                    other => SprintSyncError::TransientWrite(other.to_string()).to_string(),
                };
                let applied = self.state.commit_failed(&key, revision, message);
                warn!(
                    member_id = key.member_id,
                    date = %key.date,
                    revision,
                    error = %err,
                    "schedule commit failed"
                );
                applied
            }
        };
        if applied {
            self.stale_members.insert(key.member_id);
        }

        if self.resend.remove(&key) || (!applied && !self.debounce.contains(&key)) {
            // A newer edit exists and is no longer waiting on the debounce timer
            self.start_commit(key);
        }
    }

    fn invalidate_members<I>(&self, members: I)
    where
        I: IntoIterator<Item = MemberId>,
    {
        let mut unknown = 0usize;
        let teams: BTreeSet<TeamId> = members
            .into_iter()
            .filter_map(|member_id| {
                let team = self.roster.get(&member_id).copied();
                if team.is_none() {
                    unknown += 1;
                }
                team
            })
            .collect();

        if teams.is_empty() {
            self.cache.invalidate(TAG_COMPANY);
        } else {
            self.cache.invalidate_teams(teams);
        }
        if unknown > 0 {
            debug!(unknown, "schedule change for members outside the roster");
        }
    }

    /// Send the snapshot if the state moved, then drop stale cache tags.
    fn publish(&mut self) {
        let version = self.state.version();
        if version != self.published_version {
            self.published_version = version;
            self.snapshots.send_replace(Arc::new(self.state.snapshot()));
        }
        if !self.stale_members.is_empty() {
            let members = std::mem::take(&mut self.stale_members);
            self.invalidate_members(members);
        }
    }
}
