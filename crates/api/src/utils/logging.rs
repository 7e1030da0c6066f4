use std::time::Duration;

use sprintsync_domain::SprintSyncError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting `json` log output; anything else is text
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`). Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json { builder.json().try_init() } else { builder.try_init() };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"schedule::update"`).
/// * `elapsed` - Duration the command execution took.
/// * `error_type` - Stable error label when the command failed.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error_type: Option<&'static str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error_type {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(error_type) => warn!(command, duration_ms, error_type, "command_execution_failure"),
    }
}

/// Convert a `SprintSyncError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &SprintSyncError) -> &'static str {
    error.label()
}
