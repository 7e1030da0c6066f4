//! Command execution helpers
//!
//! Wraps context operations with timing and structured logging.

use std::time::Instant;

use sprintsync_domain::Result as DomainResult;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command, logging its duration and outcome
///
/// # Example
///
/// ```rust,ignore
/// execute_logged("schedule::retry_failed", || async {
///     ctx.store().retry_all().await
/// })
/// .await
/// ```
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    log_command_execution(command_name, start.elapsed(), result.as_ref().err().map(error_label));
    result
}

/// Execute a command and flatten its error into a `String`
///
/// For front ends that only carry error messages across their boundary.
pub async fn execute_with_string_error<F, Fut, T>(command_name: &str, command_fn: F) -> Result<T, String>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = DomainResult<T>>,
{
    execute_logged(command_name, command_fn).await.map_err(|e| e.to_string())
}
