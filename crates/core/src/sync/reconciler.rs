//! Watermark-driven incremental sync

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use sprintsync_domain::{flatten_remote, Result, SessionState, SprintSyncError, TeamId};
use tracing::{debug, info, instrument, warn};

use super::ports::SessionStore;
use crate::calendar::SprintWindow;
use crate::schedule::ports::{PersistenceService, ScheduleSink};
use crate::schedule::MergeReport;

/// Date range and team the reconciler pulls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileScope {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub team_id: Option<TeamId>,
}

impl ReconcileScope {
    pub fn for_window(window: &SprintWindow, team_id: Option<TeamId>) -> Self {
        Self { start: window.start(), end: window.end(), team_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another cycle is still running
    InFlight,
    /// No sprint window or team selected yet
    NoScope,
}

/// Result of one reconciliation cycle. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Applied {
        /// Change count reported by the server
        changes: usize,
        applied: usize,
        deferred: usize,
        watermark: DateTime<Utc>,
    },
    Skipped(SkipReason),
    Failed(SprintSyncError),
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Clears the in-flight flag when a cycle ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Pulls remote deltas since the last server-reported sync time and merges
/// them into the schedule store.
///
/// The watermark only ever moves to a `sync_timestamp` returned by the
/// server, never to the local clock.
pub struct IncrementalSyncReconciler {
    persistence: Arc<dyn PersistenceService>,
    sink: Arc<dyn ScheduleSink>,
    session: Option<Arc<dyn SessionStore>>,
    watermark: RwLock<Option<DateTime<Utc>>>,
    scope: RwLock<Option<ReconcileScope>>,
    in_flight: AtomicBool,
    fetch_timeout: Duration,
}

impl IncrementalSyncReconciler {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        sink: Arc<dyn ScheduleSink>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            persistence,
            sink,
            session: None,
            watermark: RwLock::new(None),
            scope: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            fetch_timeout,
        }
    }

    /// Persist every watermark advance through `store`
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    /// Start from a previously persisted watermark
    pub fn seed_watermark(&self, watermark: Option<DateTime<Utc>>) {
        *self.watermark.write() = watermark;
    }

    /// Current watermark
    pub fn last_sync_timestamp(&self) -> Option<DateTime<Utc>> {
        *self.watermark.read()
    }

    /// Range later cycles pull; `None` pauses syncing
    pub fn set_scope(&self, scope: Option<ReconcileScope>) {
        *self.scope.write() = scope;
    }

    pub fn scope(&self) -> Option<ReconcileScope> {
        *self.scope.read()
    }

    /// `true` while a cycle is running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one incremental cycle.
    ///
    /// Skipped when a cycle is already running. Errors are logged and
    /// returned as [`SyncOutcome::Failed`]; the watermark is left unchanged
    /// so the next cycle retries the same delta.
    #[instrument(skip(self))]
    pub async fn load_schedule_incremental(&self) -> SyncOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("incremental sync already in flight, skipping");
            return SyncOutcome::Skipped(SkipReason::InFlight);
        };
        let Some(scope) = self.scope() else {
            debug!("no sync scope set, skipping");
            return SyncOutcome::Skipped(SkipReason::NoScope);
        };

        match self.pull(scope).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, kind = err.label(), "incremental sync failed");
                SyncOutcome::Failed(err)
            }
        }
    }

    async fn pull(&self, scope: ReconcileScope) -> Result<SyncOutcome> {
        let since = self.last_sync_timestamp();
        let response = self
            .with_timeout(self.persistence.get_schedule_entries_incremental(
                scope.start,
                scope.end,
                scope.team_id,
                since,
            ))
            .await?;

        let changes = response.changes_count;
        let report = self.sink.apply_remote(flatten_remote(response.data)).await?;
        let watermark = self.advance_watermark(response.sync_timestamp).await;

        info!(
            changes,
            applied = report.applied.len(),
            deferred = report.deferred.len(),
            stale = report.stale.len(),
            watermark = %watermark,
            "incremental sync applied"
        );

        Ok(SyncOutcome::Applied {
            changes,
            applied: report.applied.len(),
            deferred: report.deferred.len(),
            watermark,
        })
    }

    /// Move the watermark forward (never backward) and persist it.
    async fn advance_watermark(&self, server_time: DateTime<Utc>) -> DateTime<Utc> {
        let watermark = {
            let mut current = self.watermark.write();
            let next = current.map_or(server_time, |existing| existing.max(server_time));
            *current = Some(next);
            next
        };

        if let Some(store) = &self.session {
            let update = Box::new(move |session: &mut SessionState| {
                session.last_sync_timestamp = Some(watermark);
            });
            if let Err(err) = store.update(update).await {
                warn!(error = %err, "failed to persist sync watermark");
            }
        }
        watermark
    }

    /// Reload the whole scope and replace the authoritative layer.
    ///
    /// The watermark is not touched: a full read carries no server sync time.
    #[instrument(skip(self))]
    pub async fn full_reload(&self) -> Result<MergeReport> {
        let scope = self
            .scope()
            .ok_or_else(|| SprintSyncError::NotFound("no sprint window selected".to_string()))?;

        let map = self
            .with_timeout(self.persistence.get_schedule_entries(scope.start, scope.end, scope.team_id))
            .await?;
        let report = self.sink.replace_authoritative(flatten_remote(map)).await?;

        info!(applied = report.applied.len(), deferred = report.deferred.len(), "full schedule reload");
        Ok(report)
    }

    async fn with_timeout<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.fetch_timeout, fut).await.map_err(|_| {
            SprintSyncError::Timeout(u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX))
        })?
    }
}
