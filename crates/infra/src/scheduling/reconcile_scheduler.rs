//! Visibility-aware timer driving incremental sync.
//!
//! Cycles run on a fixed interval only while the consuming surface is
//! active. A focus-regained signal triggers an immediate cycle. Cycle
//! failures are already logged and swallowed by the reconciler, so the loop
//! itself never stops on error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sprintsync_core::IncrementalSyncReconciler;
//! use sprintsync_infra::scheduling::{ReconcileScheduler, ReconcileSchedulerConfig};
//!
//! # async fn example(reconciler: Arc<IncrementalSyncReconciler>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = ReconcileScheduler::new(reconciler, ReconcileSchedulerConfig::default());
//!
//! scheduler.start().await?;
//! scheduler.set_active(true);
//! // ... surface regains focus ...
//! scheduler.focus_regained();
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use sprintsync_core::{IncrementalSyncReconciler, SyncOutcome};
use sprintsync_domain::SyncConfig;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the reconcile scheduler
#[derive(Debug, Clone)]
pub struct ReconcileSchedulerConfig {
    /// Time between cycles while the surface is active
    pub interval: Duration,
    /// How long `stop` waits for the loop to exit
    pub join_timeout: Duration,
}

impl Default for ReconcileSchedulerConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for ReconcileSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self { interval: config.interval(), join_timeout: Duration::from_secs(5) }
    }
}

/// Signals shared between the scheduler and its loop
struct LoopContext {
    reconciler: Arc<IncrementalSyncReconciler>,
    active: watch::Receiver<bool>,
    focus: Arc<Notify>,
}

/// Periodic driver for [`IncrementalSyncReconciler`]
pub struct ReconcileScheduler {
    reconciler: Arc<IncrementalSyncReconciler>,
    config: ReconcileSchedulerConfig,
    active: watch::Sender<bool>,
    focus: Arc<Notify>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ReconcileScheduler {
    /// Create a stopped scheduler. The surface starts inactive.
    pub fn new(reconciler: Arc<IncrementalSyncReconciler>, config: ReconcileSchedulerConfig) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            reconciler,
            config,
            active,
            focus: Arc::new(Notify::new()),
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "Starting reconcile scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let context = LoopContext {
            reconciler: Arc::clone(&self.reconciler),
            active: self.active.subscribe(),
            focus: Arc::clone(&self.focus),
        };
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::reconcile_loop(context, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// A cycle already talking to the remote store finishes first, bounded
    /// by the join timeout.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or the loop does not exit
    /// in time
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping reconcile scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
        }

        info!("Reconcile scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Record whether the consuming surface is visible
    pub fn set_active(&self, active: bool) {
        self.active.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Mark the surface active and request an immediate cycle
    pub fn focus_regained(&self) {
        self.set_active(true);
        self.focus.notify_one();
    }

    async fn reconcile_loop(context: LoopContext, interval: Duration, cancel: CancellationToken) {
        let LoopContext { reconciler, mut active, focus } = context;

        loop {
            if !*active.borrow_and_update() {
                debug!("Surface inactive, reconcile timer paused");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = active.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Reconcile loop cancelled");
                    break;
                }
                changed = active.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = focus.notified() => {
                    debug!("Focus regained, reconciling now");
                    Self::run_cycle(&reconciler).await;
                }
                () = tokio::time::sleep(interval) => {
                    Self::run_cycle(&reconciler).await;
                }
            }
        }
    }

    async fn run_cycle(reconciler: &IncrementalSyncReconciler) {
        match reconciler.load_schedule_incremental().await {
            SyncOutcome::Applied { changes, applied, deferred, .. } => {
                debug!(changes, applied, deferred, "Reconcile cycle completed");
            }
            SyncOutcome::Skipped(reason) => debug!(?reason, "Reconcile cycle skipped"),
            // Already logged by the reconciler
            SyncOutcome::Failed(_) => {}
        }
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_sync_interval() {
        let sync = SyncConfig { interval_seconds: 45, ..SyncConfig::default() };
        let config = ReconcileSchedulerConfig::from(&sync);
        assert_eq!(config.interval, Duration::from_secs(45));
        assert_eq!(config.join_timeout, Duration::from_secs(5));
    }
}
