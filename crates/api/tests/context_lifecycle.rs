//! Integration tests for AppContext lifecycle
//!
//! Tests verify that AppContext loads the roster, sprint window and schedule
//! on creation, routes edits through the optimistic store and shuts down
//! gracefully.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use sprintsync_domain::{
    Config, EntryState, RawTeamMember, RemoteSprintWindow, RemoteTeam, ScheduleKey, SessionConfig,
    SprintSyncError, SyncConfig, WorkOption,
};
use sprintsync_infra::InMemoryPersistence;
use sprintsync_lib::context::AppContext;
use tempfile::TempDir;

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("valid January date")
}

fn member(id: i64, team_id: i64, is_manager: bool) -> RawTeamMember {
    RawTeamMember {
        id,
        name: format!("member-{id}"),
        team_id: Some(team_id),
        is_manager: Some(is_manager),
        ..RawTeamMember::default()
    }
}

/// Team 5 = {1 regular, 2 manager}, team 6 = {3 regular}, sprint Jan 14-25
fn persistence() -> InMemoryPersistence {
    InMemoryPersistence::new()
        .with_roster(
            vec![
                RemoteTeam { id: 5, name: "Platform".into(), sprint_length_weeks: Some(2) },
                RemoteTeam { id: 6, name: "Payments".into(), sprint_length_weeks: Some(2) },
            ],
            vec![member(1, 5, false), member(2, 5, true), member(3, 6, false)],
        )
        .with_sprint(RemoteSprintWindow {
            start: jan(14),
            end: jan(25),
            length_weeks: 2,
            sprint_number: 4,
        })
}

/// Config with background sync off and the session file inside `dir`
fn test_config(dir: &TempDir) -> Config {
    let mut config = Config {
        sync: SyncConfig { enabled: false, ..SyncConfig::default() },
        session: SessionConfig { path: dir.path().join("session.json") },
        ..Config::default()
    };
    config.schedule.debounce_ms = 500;
    config
}

/// Helper function to create a test AppContext over `persistence`
///
/// Returns both the context and temp directory to keep temp_dir alive.
async fn create_test_context(persistence: &InMemoryPersistence) -> (AppContext, TempDir) {
    let dir = TempDir::new().expect("failed to create temporary test directory");
    let ctx = AppContext::new(test_config(&dir), Arc::new(persistence.clone()))
        .await
        .expect("context should initialize");
    (ctx, dir)
}

/// Test that AppContext::new loads everything the selectors need
///
/// This test verifies:
/// - Teams and members are fetched with roles normalised
/// - The sprint window is validated and cached
/// - Seeded remote entries are visible as committed cells
/// - A fresh session has no selection
#[tokio::test]
async fn test_context_creation_loads_remote_state() {
    let persistence = persistence();
    persistence.seed(1, jan(15), WorkOption::FullDay);
    let (ctx, _dir) = create_test_context(&persistence).await;

    assert_eq!(ctx.teams().len(), 2);
    assert_eq!(ctx.members(Some(5)).len(), 2);
    assert_eq!(ctx.members(None).len(), 3);

    let window = ctx.get_current_sprint_window().await.unwrap();
    assert_eq!((window.start(), window.end(), window.sprint_number()), (jan(14), jan(25), 4));
    assert_eq!(ctx.cache().cached_sprint_window(), Some(window));

    let cell = ctx.get_schedule_cell(1, jan(15)).expect("seeded cell");
    assert_eq!(cell.entry.value, WorkOption::FullDay);
    assert_eq!(cell.state, EntryState::Committed);

    let session = ctx.session();
    assert_eq!(session.selected_team_id, None);
    assert_eq!(session.active_tab_id, None);

    ctx.shutdown().await.unwrap();
}

/// Test that a context still starts when the remote store is unreachable
#[tokio::test]
async fn test_context_starts_with_reads_down() {
    let persistence = persistence();
    persistence.set_reads_down(true);

    let (ctx, _dir) = create_test_context(&persistence).await;
    assert!(ctx.teams().is_empty());
    assert!(ctx.get_schedule_data().cells().is_empty());

    persistence.set_reads_down(false);
    ctx.sync_schedule_with_server().await.unwrap();
    assert_eq!(ctx.teams().len(), 2);

    ctx.shutdown().await.unwrap();
}

/// Test that role and roster checks run before the store sees an edit
#[tokio::test]
async fn test_update_rejects_invalid_edits() {
    let persistence = persistence();
    let (ctx, _dir) = create_test_context(&persistence).await;

    let err = ctx.update_schedule_optimistic(2, jan(15), WorkOption::FullDay, None).await.unwrap_err();
    assert!(matches!(err, SprintSyncError::Validation(_)), "got {err:?}");
    assert!(ctx.get_schedule_cell(2, jan(15)).is_none());

    let err = ctx.update_schedule_optimistic(99, jan(15), WorkOption::HalfDay, None).await.unwrap_err();
    assert!(matches!(err, SprintSyncError::NotFound(_)), "got {err:?}");

    // Half days are fine for managers
    let cell = ctx.update_schedule_optimistic(2, jan(15), WorkOption::HalfDay, None).await.unwrap();
    assert_eq!(cell.state, EntryState::Pending);

    ctx.shutdown().await.unwrap();
}

/// Validates read-your-writes and the commit path end to end.
///
/// # Test Steps
/// 1. Edit a cell; it is Pending immediately and counted in utilization
/// 2. Let the debounce elapse; one remote write is recorded
/// 3. Reconcile; the cell is Committed with the edited value
#[tokio::test(start_paused = true)]
async fn test_edit_is_visible_then_committed() {
    let persistence = persistence();
    let (ctx, _dir) = create_test_context(&persistence).await;

    let before = ctx.get_team_utilization(5).await.unwrap();
    assert_eq!(before.actual_hours, 0.0);

    ctx.update_schedule_optimistic(1, jan(15), WorkOption::FullDay, Some("on call".into()))
        .await
        .unwrap();

    let cell = ctx.get_schedule_cell(1, jan(15)).unwrap();
    assert_eq!((cell.entry.value, cell.state), (WorkOption::FullDay, EntryState::Pending));
    let after = ctx.get_team_utilization(5).await.unwrap();
    assert_eq!(after.actual_hours, 7.0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let writes = persistence.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].reason.as_deref(), Some("on call"));

    assert!(ctx.load_schedule_incremental().await.is_applied());
    let cell = ctx.get_schedule_cell(1, jan(15)).unwrap();
    assert_eq!((cell.entry.value, cell.state), (WorkOption::FullDay, EntryState::Committed));
    assert!(ctx.last_sync_timestamp().is_some());

    ctx.shutdown().await.unwrap();
}

/// Test team and company roll-ups over seeded entries
///
/// Team 5 holds 10 regular days (70h) plus 10 manager days (35h); team 6
/// holds 70h. One full day out of 175h rounds to 4%.
#[tokio::test]
async fn test_team_and_company_utilization() {
    let persistence = persistence();
    persistence.seed(1, jan(15), WorkOption::FullDay);
    persistence.seed(3, jan(16), WorkOption::Absent);
    let (ctx, _dir) = create_test_context(&persistence).await;

    let team = ctx.get_team_utilization(5).await.unwrap();
    assert_eq!(team.member_count, 2);
    assert_eq!(team.manager_count, 1);
    assert_eq!(team.max_capacity_hours, 105.0);
    assert_eq!(team.utilization_percentage, 7);

    let company = ctx.get_company_utilization().await.unwrap();
    assert_eq!(company.team_count, 2);
    assert_eq!(company.member_count, 3);
    assert_eq!(company.max_capacity_hours, 175.0);
    assert_eq!(company.actual_hours, 7.0);
    assert_eq!(company.utilization_percentage, 4);

    let members = ctx.get_member_summaries(6).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].absent_days, 1);

    let weeks = ctx.get_weekly_hours(1).await.unwrap();
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].hours, 7.0);
    assert_eq!(weeks[1].hours, 0.0);

    let err = ctx.get_team_utilization(42).await.unwrap_err();
    assert!(matches!(err, SprintSyncError::NotFound(_)));

    ctx.shutdown().await.unwrap();
}

/// Test that a member's sprint row fills weekends without storing them
///
/// Jan 19 and 20 are the only weekend days of the Jan 14-25 sprint.
#[tokio::test]
async fn test_member_schedule_fills_weekends() {
    let persistence = persistence();
    persistence.seed(1, jan(15), WorkOption::FullDay);
    let (ctx, _dir) = create_test_context(&persistence).await;

    let row = ctx.get_member_schedule(1).await.unwrap();
    let dates: Vec<NaiveDate> = row.iter().map(|entry| entry.date).collect();
    assert_eq!(dates, vec![jan(15), jan(19), jan(20)]);
    assert!(!row[0].is_weekend);
    assert!(row[1..].iter().all(|entry| entry.is_weekend && entry.value == WorkOption::Absent));
    assert_eq!(row[1].reason.as_deref(), Some("Weekend (auto-generated)"));

    assert!(ctx.get_schedule_cell(1, jan(19)).is_none());
    assert_eq!(ctx.get_team_utilization(5).await.unwrap().actual_hours, 7.0);
    assert!(matches!(ctx.get_member_schedule(42).await, Err(SprintSyncError::NotFound(_))));

    ctx.shutdown().await.unwrap();
}

/// Test that explicit invalidation forces a recompute from fresh data
#[tokio::test]
async fn test_invalidate_cache_recomputes() {
    let persistence = persistence();
    let (ctx, _dir) = create_test_context(&persistence).await;

    assert_eq!(ctx.get_company_utilization().await.unwrap().actual_hours, 0.0);

    // Land a remote change without going through the reconciler
    persistence.seed(3, jan(17), WorkOption::FullDay);
    ctx.sync_schedule_with_server().await.unwrap();
    assert_eq!(ctx.get_company_utilization().await.unwrap().actual_hours, 7.0);

    assert!(ctx.invalidate_cache("company") >= 1);
    assert!(ctx.cache().cached_sprint_window().is_some());
    assert!(ctx.invalidate_cache("sprint") >= 1);
    assert!(ctx.cache().cached_sprint_window().is_none());

    ctx.shutdown().await.unwrap();
}

/// Validates that a failed commit is kept and retried on request.
///
/// # Test Steps
/// 1. Take writes down and edit a cell
/// 2. After the debounce the cell is Failed but keeps its value
/// 3. Bring writes back and retry everything
/// 4. The retried write lands remotely
#[tokio::test(start_paused = true)]
async fn test_failed_commit_retried_on_request() {
    let persistence = persistence();
    let (ctx, _dir) = create_test_context(&persistence).await;
    persistence.set_writes_down(true);

    ctx.update_schedule_optimistic(3, jan(18), WorkOption::HalfDay, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let cell = ctx.get_schedule_cell(3, jan(18)).unwrap();
    assert_eq!((cell.entry.value, cell.state), (WorkOption::HalfDay, EntryState::Failed));
    assert_eq!(ctx.get_schedule_data().failed_keys(), vec![ScheduleKey::new(3, jan(18))]);

    persistence.set_writes_down(false);
    assert_eq!(ctx.retry_failed(None).await.unwrap(), 1);
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(persistence.entry(3, jan(18)).map(|e| e.value), Some(WorkOption::HalfDay));
    assert!(ctx.get_schedule_data().failed_keys().is_empty());

    ctx.shutdown().await.unwrap();
}

/// Test that team and tab selections survive a restart
#[tokio::test]
async fn test_session_selection_persists() {
    let persistence = persistence();
    let dir = TempDir::new().unwrap();

    let ctx = AppContext::new(test_config(&dir), Arc::new(persistence.clone())).await.unwrap();
    ctx.select_team(Some(6)).await.unwrap();
    let state = ctx.select_tab("capacity").await.unwrap();
    assert_eq!(state.selected_team_id, Some(6));

    let err = ctx.select_team(Some(404)).await.unwrap_err();
    assert!(matches!(err, SprintSyncError::NotFound(_)));

    ctx.load_schedule_incremental().await;
    let watermark = ctx.last_sync_timestamp();
    assert!(watermark.is_some());
    ctx.shutdown().await.unwrap();

    let reopened = AppContext::new(test_config(&dir), Arc::new(persistence.clone())).await.unwrap();
    let session = reopened.session();
    assert_eq!(session.selected_team_id, Some(6));
    assert_eq!(session.active_tab_id.as_deref(), Some("capacity"));
    assert_eq!(session.last_sync_timestamp, watermark);
    reopened.shutdown().await.unwrap();
}

/// Test that shutdown flushes pending edits and is idempotent
///
/// This test verifies:
/// - An edit still inside its debounce window is committed by shutdown
/// - A second shutdown call succeeds
#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_and_is_idempotent() {
    let persistence = persistence();
    let (ctx, _dir) = create_test_context(&persistence).await;

    ctx.update_schedule_optimistic(1, jan(21), WorkOption::HalfDay, None).await.unwrap();
    assert!(persistence.writes().is_empty());

    ctx.shutdown().await.unwrap();
    assert_eq!(persistence.entry(1, jan(21)).map(|e| e.value), Some(WorkOption::HalfDay));

    ctx.shutdown().await.unwrap();
}

/// Test that the background scheduler starts and stops with the context
#[tokio::test(flavor = "multi_thread")]
async fn test_context_with_sync_enabled_shuts_down() {
    let persistence = persistence();
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.sync.enabled = true;

    let ctx = AppContext::new(config, Arc::new(persistence)).await.unwrap();
    ctx.set_surface_active(true).await;
    ctx.focus_regained().await;

    let result = tokio::time::timeout(Duration::from_secs(20), ctx.shutdown()).await;
    assert!(matches!(result, Ok(Ok(()))), "shutdown should complete, got {result:?}");
}
