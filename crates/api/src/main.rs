//! SprintSync - sprint capacity planning with optimistic schedule sync
//!
//! Runs the application context against an in-process schedule store seeded
//! with a demo roster, then idles with background sync active until Ctrl-C.

use std::sync::Arc;

use anyhow::Context as _;
use chrono::{Datelike, Duration as ChronoDuration, Local};
use sprintsync_domain::{RawTeamMember, RemoteSprintWindow, RemoteTeam, WorkOption};
use sprintsync_infra::InMemoryPersistence;
use sprintsync_lib::utils::logging::init_tracing;
use sprintsync_lib::AppContext;

fn demo_persistence() -> InMemoryPersistence {
    let today = Local::now().date_naive();
    let start = today - ChronoDuration::days(i64::from(today.weekday().num_days_from_sunday()));
    let member = |id, name: &str, team_id, title: &str| RawTeamMember {
        id,
        name: name.to_string(),
        team_id: Some(team_id),
        is_manager: None,
        role: None,
        title: Some(title.to_string()),
    };

    let persistence = InMemoryPersistence::new()
        .with_roster(
            vec![
                RemoteTeam { id: 1, name: "Platform".into(), sprint_length_weeks: Some(2) },
                RemoteTeam { id: 2, name: "Payments".into(), sprint_length_weeks: Some(2) },
            ],
            vec![
                member(10, "Avery", 1, "Engineering Manager"),
                member(11, "Rowan", 1, "Backend Engineer"),
                member(12, "Sasha", 1, "Frontend Engineer"),
                member(20, "Jordan", 2, "Team Manager"),
                member(21, "Kai", 2, "Data Engineer"),
            ],
        )
        .with_sprint(RemoteSprintWindow {
            start,
            end: start + ChronoDuration::days(11),
            length_weeks: 2,
            sprint_number: 1,
        });

    persistence.seed(11, start, WorkOption::FullDay);
    persistence.seed(11, start + ChronoDuration::days(1), WorkOption::HalfDay);
    persistence.seed(21, start, WorkOption::Absent);
    persistence
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    let config = sprintsync_infra::config::load().context("failed to load configuration")?;
    let ctx = AppContext::new(config, Arc::new(demo_persistence()))
        .await
        .context("failed to initialize application context")?;

    let window = ctx.get_current_sprint_window().await?;
    let company = ctx.get_company_utilization().await?;
    tracing::info!(
        sprint = window.sprint_number(),
        start = %window.start(),
        end = %window.end(),
        utilization = company.utilization_percentage,
        completion = company.completion_percentage,
        "SprintSync ready"
    );
    tracing::debug!(teams = %serde_json::to_string(&company.teams)?, "team capacity");

    ctx.set_surface_active(true).await;
    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;

    ctx.shutdown().await.context("shutdown did not complete cleanly")?;
    Ok(())
}
