//! Application context - dependency injection container
//!
//! Owns every long-lived component and exposes the selectors and mutators
//! a presentation layer calls. Reads come from the latest published
//! schedule snapshot plus the capacity cache; writes go through the store
//! coordinator.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::RwLock;
use sprintsync_core::capacity::{
    auto_generate_weekend_entries, compute_company_summary, compute_team_summary, validate_work_option,
    weekly_hours,
};
use sprintsync_core::sync::ports::SessionStore;
use sprintsync_core::{
    CapacityCache, IncrementalSyncReconciler, MergeReport, PersistenceService, ReconcileScope,
    ScheduleSnapshot, SprintWindow, SyncOutcome,
};
use sprintsync_domain::constants::TAG_SPRINT;
use sprintsync_domain::{
    CompanyCapacitySummary, Config, MemberCapacitySummary, MemberId, Result, ScheduleCell,
    ScheduleEntry, ScheduleKey, SessionState, SprintSyncError, Team, TeamCapacitySummary, TeamId,
    TeamMember, WeeklyHours, WorkOption,
};
use sprintsync_infra::{
    FileSessionStore, ReconcileScheduler, ReconcileSchedulerConfig, ScheduleStore,
    ScheduleStoreHandle, SchedulerError, StoreSettings,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::utils::command_helpers::execute_logged;

/// Type alias for persistence port trait object
type DynPersistence = dyn PersistenceService + 'static;

/// Type alias for session store port trait object
type DynSessionStore = dyn SessionStore + 'static;

/// How long shutdown waits for the store to drain in-flight commits
const STORE_JOIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Teams and members as last fetched, with roles already normalised
#[derive(Debug, Default)]
struct Roster {
    teams: Vec<Team>,
    members: BTreeMap<MemberId, TeamMember>,
}

impl Roster {
    fn members_of(&self, team_id: TeamId) -> Vec<TeamMember> {
        self.members.values().filter(|m| m.team_id == Some(team_id)).cloned().collect()
    }

    fn team_map(&self) -> HashMap<MemberId, TeamId> {
        self.members.values().filter_map(|m| m.team_id.map(|team| (m.id, team))).collect()
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    persistence: Arc<DynPersistence>,
    store: ScheduleStoreHandle,
    store_task: Mutex<Option<JoinHandle<()>>>,
    reconciler: Arc<IncrementalSyncReconciler>,
    scheduler: Mutex<ReconcileScheduler>,
    cache: Arc<CapacityCache>,
    roster: RwLock<Roster>,
    session_store: Arc<DynSessionStore>,
    session: RwLock<SessionState>,
}

impl AppContext {
    /// Create a context over `persistence`, keeping the session file at
    /// `config.session.path`
    ///
    /// # Errors
    /// Returns an error when the reconcile scheduler fails to start.
    pub async fn new(config: Config, persistence: Arc<DynPersistence>) -> Result<Self> {
        let session_store: Arc<DynSessionStore> =
            Arc::new(FileSessionStore::new(config.session.path.clone()));
        Self::new_with_session_store(config, persistence, session_store).await
    }

    /// Create a context with an explicit session store
    ///
    /// Remote failures while loading the roster, sprint window or schedule
    /// are logged; the context starts with whatever loaded and the
    /// background sync fills in the rest.
    ///
    /// # Errors
    /// Returns an error when the reconcile scheduler fails to start.
    pub async fn new_with_session_store(
        config: Config,
        persistence: Arc<DynPersistence>,
        session_store: Arc<DynSessionStore>,
    ) -> Result<Self> {
        let session = session_store.load().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load session, using defaults");
            SessionState::default()
        });

        let cache = Arc::new(CapacityCache::new(config.cache.clone()));
        let (store, store_task) = ScheduleStore::spawn(
            Arc::clone(&persistence),
            Arc::clone(&cache),
            StoreSettings::from(&config.schedule),
        );

        let reconciler = Arc::new(
            IncrementalSyncReconciler::new(
                Arc::clone(&persistence),
                Arc::new(store.clone()),
                config.sync.fetch_timeout(),
            )
            .with_session_store(Arc::clone(&session_store)),
        );
        reconciler.seed_watermark(session.last_sync_timestamp);

        let scheduler =
            ReconcileScheduler::new(Arc::clone(&reconciler), ReconcileSchedulerConfig::from(&config.sync));

        let ctx = Self {
            config,
            persistence,
            store,
            store_task: Mutex::new(Some(store_task)),
            reconciler,
            scheduler: Mutex::new(scheduler),
            cache,
            roster: RwLock::new(Roster::default()),
            session_store,
            session: RwLock::new(session),
        };

        if let Err(err) = ctx.refresh_remote_context().await {
            tracing::warn!(error = %err, kind = err.label(), "initial roster or sprint load failed");
        } else if let Err(err) = ctx.reconciler.full_reload().await {
            tracing::warn!(error = %err, kind = err.label(), "initial schedule load failed");
        }

        if ctx.config.sync.enabled {
            // Start the scheduler with timeout (fail-fast initialization)
            let start_timeout = Duration::from_secs(10);
            tokio::time::timeout(start_timeout, async { ctx.scheduler.lock().await.start().await })
                .await
                .map_err(|_| {
                    tracing::error!(timeout_secs = 10, "ReconcileScheduler start timed out");
                    SprintSyncError::Internal("ReconcileScheduler start timed out after 10s".into())
                })?
                .map_err(|err| {
                    tracing::error!(error = %err, "failed to start ReconcileScheduler");
                    SprintSyncError::from(err)
                })?;
        }

        let (teams, members) = {
            let roster = ctx.roster.read();
            (roster.teams.len(), roster.members.len())
        };
        tracing::info!(
            teams,
            members,
            sync_enabled = ctx.config.sync.enabled,
            "SprintSync context initialized"
        );
        Ok(ctx)
    }

    /// Reload teams, members and the sprint window, then rescope sync
    async fn refresh_remote_context(&self) -> Result<SprintWindow> {
        let teams = self.persistence.get_teams().await?;
        let members = self.persistence.get_team_members(None).await?;

        let roster = Roster {
            teams: teams.into_iter().map(Team::from).collect(),
            members: members.into_iter().map(TeamMember::from).map(|m| (m.id, m)).collect(),
        };
        let team_map = roster.team_map();
        *self.roster.write() = roster;
        self.store.set_roster(team_map).await?;

        self.cache.invalidate(TAG_SPRINT);
        let window = self.get_current_sprint_window().await?;
        self.reconciler.set_scope(Some(ReconcileScope::for_window(&window, None)));
        Ok(window)
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    /// Latest schedule snapshot (authoritative plus optimistic layers)
    pub fn get_schedule_data(&self) -> Arc<ScheduleSnapshot> {
        self.store.snapshot()
    }

    /// Effective value of one cell
    pub fn get_schedule_cell(&self, member_id: MemberId, date: NaiveDate) -> Option<ScheduleCell> {
        self.store.snapshot().cell(&ScheduleKey::new(member_id, date))
    }

    /// Current sprint window, served from cache while fresh
    ///
    /// # Errors
    /// Fails when the remote window cannot be fetched or is invalid.
    pub async fn get_current_sprint_window(&self) -> Result<SprintWindow> {
        if let Some(window) = self.cache.cached_sprint_window() {
            return Ok(window);
        }
        let remote = self.persistence.get_current_sprint_window().await?;
        let window = SprintWindow::from_remote(remote)?;
        self.cache.put_sprint_window(window);
        Ok(window)
    }

    /// Hours per sprint week for one member
    ///
    /// # Errors
    /// `NotFound` for a member outside the roster.
    pub async fn get_weekly_hours(&self, member_id: MemberId) -> Result<Vec<WeeklyHours>> {
        let window = self.get_current_sprint_window().await?;
        let member = self.member(member_id)?;
        let entries = self.store.snapshot().entries_for_member(member_id);
        Ok(weekly_hours(&member, &window, &entries))
    }

    /// One member's sprint row in date order
    ///
    /// Weekend days without an entry are filled with Absent placeholders.
    /// The placeholders are never written to the store and carry no hours.
    ///
    /// # Errors
    /// `NotFound` for a member outside the roster.
    pub async fn get_member_schedule(&self, member_id: MemberId) -> Result<Vec<ScheduleEntry>> {
        let window = self.get_current_sprint_window().await?;
        self.member(member_id)?;

        let mut by_date: BTreeMap<NaiveDate, ScheduleEntry> = self
            .store
            .snapshot()
            .entries_for_member(member_id)
            .into_iter()
            .filter(|entry| window.contains(entry.date))
            .map(|entry| (entry.date, entry))
            .collect();
        for placeholder in auto_generate_weekend_entries(member_id, &window.days()) {
            by_date.entry(placeholder.date).or_insert(placeholder);
        }
        Ok(by_date.into_values().collect())
    }

    /// Capacity summary for one team
    ///
    /// # Errors
    /// `NotFound` for an unknown team.
    pub async fn get_team_utilization(&self, team_id: TeamId) -> Result<TeamCapacitySummary> {
        let window = self.get_current_sprint_window().await?;
        self.team_summary(team_id, &window)
    }

    /// Per-member summaries for one team
    ///
    /// # Errors
    /// `NotFound` for an unknown team.
    pub async fn get_member_summaries(&self, team_id: TeamId) -> Result<Vec<MemberCapacitySummary>> {
        Ok(self.get_team_utilization(team_id).await?.members)
    }

    /// Company roll-up over every team
    ///
    /// # Errors
    /// Fails when the sprint window cannot be resolved.
    pub async fn get_company_utilization(&self) -> Result<CompanyCapacitySummary> {
        let window = self.get_current_sprint_window().await?;
        let team_ids: Vec<TeamId> = self.roster.read().teams.iter().map(|t| t.id).collect();

        let (summary, outcome) = self.cache.company_summary(|| {
            let teams = team_ids
                .iter()
                .map(|team_id| self.team_summary(*team_id, &window))
                .collect::<Result<Vec<_>>>()?;
            Ok(compute_company_summary(teams))
        })?;
        tracing::trace!(?outcome, "company utilization");
        Ok(summary)
    }

    /// Persisted UI session state with the live sync watermark
    pub fn session(&self) -> SessionState {
        let mut session = self.session.read().clone();
        session.last_sync_timestamp = self.reconciler.last_sync_timestamp();
        session
    }

    /// Teams as last fetched
    pub fn teams(&self) -> Vec<Team> {
        self.roster.read().teams.clone()
    }

    /// Members of one team, or everyone
    pub fn members(&self, team_id: Option<TeamId>) -> Vec<TeamMember> {
        let roster = self.roster.read();
        match team_id {
            Some(team_id) => roster.members_of(team_id),
            None => roster.members.values().cloned().collect(),
        }
    }

    /// Server watermark of the last applied incremental sync
    pub fn last_sync_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.reconciler.last_sync_timestamp()
    }

    pub fn cache(&self) -> &CapacityCache {
        &self.cache
    }

    fn member(&self, member_id: MemberId) -> Result<TeamMember> {
        self.roster
            .read()
            .members
            .get(&member_id)
            .cloned()
            .ok_or_else(|| SprintSyncError::NotFound(format!("member {member_id}")))
    }

    fn team_summary(&self, team_id: TeamId, window: &SprintWindow) -> Result<TeamCapacitySummary> {
        let (summary, outcome) = self.cache.team_summary(team_id, || {
            let (team, members) = {
                let roster = self.roster.read();
                let team = roster
                    .teams
                    .iter()
                    .find(|t| t.id == team_id)
                    .cloned()
                    .ok_or_else(|| SprintSyncError::NotFound(format!("team {team_id}")))?;
                (team, roster.members_of(team_id))
            };
            let entries = self.store.snapshot().entries_by_member();
            Ok(compute_team_summary(&team, &members, &entries, &window.days()))
        })?;
        tracing::trace!(team_id, ?outcome, "team utilization");
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Apply an edit locally and schedule its commit
    ///
    /// The member's role is checked before the store sees the edit. Returns
    /// once the new value is visible to every selector.
    ///
    /// # Errors
    /// `NotFound` for an unknown member, `Validation` for a value the role
    /// does not allow.
    pub async fn update_schedule_optimistic(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        value: WorkOption,
        reason: Option<String>,
    ) -> Result<ScheduleCell> {
        execute_logged("schedule::update_optimistic", || async {
            let member = self.member(member_id)?;
            validate_work_option(&member, value)?;
            self.store.update(ScheduleEntry::new(member_id, date, value).with_reason(reason)).await
        })
        .await
    }

    /// Reload roster, sprint window and the full schedule
    ///
    /// # Errors
    /// Any remote failure; local edits are never discarded.
    pub async fn sync_schedule_with_server(&self) -> Result<MergeReport> {
        execute_logged("schedule::sync_with_server", || async {
            self.refresh_remote_context().await?;
            self.reconciler.full_reload().await
        })
        .await
    }

    /// Run one incremental cycle now
    pub async fn load_schedule_incremental(&self) -> SyncOutcome {
        self.reconciler.load_schedule_incremental().await
    }

    /// Drop every cached aggregate carrying `tag`
    pub fn invalidate_cache(&self, tag: &str) -> usize {
        let removed = self.cache.invalidate(tag);
        tracing::debug!(tag, removed, "cache invalidated on request");
        removed
    }

    /// Resubmit failed edits: one key, or all when `key` is `None`
    ///
    /// # Errors
    /// Fails only when the store has stopped.
    pub async fn retry_failed(&self, key: Option<ScheduleKey>) -> Result<usize> {
        execute_logged("schedule::retry_failed", || async {
            match key {
                Some(key) => Ok(usize::from(self.store.retry(key).await?)),
                None => self.store.retry_all().await,
            }
        })
        .await
    }

    /// Pause or resume the background sync timer
    pub async fn set_surface_active(&self, active: bool) {
        self.scheduler.lock().await.set_active(active);
    }

    /// Resume the timer and reconcile immediately
    pub async fn focus_regained(&self) {
        self.scheduler.lock().await.focus_regained();
    }

    /// Remember the selected team
    ///
    /// # Errors
    /// `NotFound` for a team outside the roster; session write failures.
    pub async fn select_team(&self, team_id: Option<TeamId>) -> Result<SessionState> {
        if let Some(team_id) = team_id {
            if !self.roster.read().teams.iter().any(|t| t.id == team_id) {
                return Err(SprintSyncError::NotFound(format!("team {team_id}")));
            }
        }
        self.update_session(Box::new(move |s| s.selected_team_id = team_id)).await
    }

    /// Remember the active tab
    ///
    /// # Errors
    /// Session write failures.
    pub async fn select_tab(&self, tab_id: impl Into<String>) -> Result<SessionState> {
        let tab_id = tab_id.into();
        self.update_session(Box::new(move |s| s.active_tab_id = Some(tab_id))).await
    }

    async fn update_session(
        &self,
        update: sprintsync_core::sync::ports::SessionUpdate,
    ) -> Result<SessionState> {
        let state = self.session_store.update(update).await?;
        *self.session.write() = state.clone();
        Ok(state)
    }

    /// Stop background sync, flush pending edits and wait for the store
    ///
    /// # Errors
    /// Returns the first failure; later steps still run.
    pub async fn shutdown(&self) -> Result<()> {
        let mut first_error = None;

        match self.scheduler.lock().await.stop().await {
            Ok(()) | Err(SchedulerError::NotRunning) => {}
            Err(err) => {
                tracing::warn!(error = %err, "reconcile scheduler did not stop cleanly");
                first_error.get_or_insert(SprintSyncError::from(err));
            }
        }

        if let Err(err) = self.store.shutdown().await {
            tracing::debug!(error = %err, "schedule store already stopped");
        }
        if let Some(task) = self.store_task.lock().await.take() {
            match tokio::time::timeout(STORE_JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_error.get_or_insert(SprintSyncError::Internal(format!(
                        "schedule store task failed: {err}"
                    )));
                }
                Err(_) => {
                    first_error.get_or_insert(SprintSyncError::Timeout(
                        u64::try_from(STORE_JOIN_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
                    ));
                }
            }
        }

        let failed = self.store.snapshot().failed_keys().len();
        tracing::info!(failed, "SprintSync context shut down");
        first_error.map_or(Ok(()), Err)
    }
}
