//! Notification loop
//!
//! Jobs run one at a time, in arrival order. A failing job never stops the
//! loop; a failing notification source is retried after a short pause.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::collaborators::NotificationSource;
use crate::config::DEFAULT_RECONNECT_DELAY_SECS;
use crate::lifecycle::JobRunner;

/// Totals for one dispatcher run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
}

pub struct Dispatcher<N> {
    notifications: N,
    runner: JobRunner,
    reconnect_delay: Duration,
}

impl<N: NotificationSource> Dispatcher<N> {
    pub fn new(notifications: N, runner: JobRunner) -> Self {
        Self {
            notifications,
            runner,
            reconnect_delay: Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS),
        }
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Process notifications until the source closes or Ctrl-C arrives
    pub async fn run(self) -> DispatchStats {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Process notifications until the source closes or `shutdown` resolves
    ///
    /// `shutdown` is created once and checked before every receive, so a
    /// request that arrives mid-job stops the loop once that job finishes.
    pub async fn run_until<F>(mut self, shutdown: F) -> DispatchStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = DispatchStats::default();
        tokio::pin!(shutdown);

        loop {
            let received = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                },
                received = self.notifications.recv() => received,
            };

            match received {
                Ok(Some(payload)) => self.dispatch(&payload, &mut stats).await,
                Ok(None) => {
                    info!("Notification source closed");
                    break;
                },
                Err(e) => {
                    error!(error = %format!("{:#}", e), "Failed to receive notification");
                    tokio::time::sleep(self.reconnect_delay).await;
                },
            }
        }

        info!(
            completed = stats.completed,
            failed = stats.failed,
            skipped = stats.skipped,
            "Dispatcher stopped"
        );
        stats
    }

    async fn dispatch(&self, payload: &str, stats: &mut DispatchStats) {
        let job_id = payload.trim();
        if job_id.is_empty() {
            warn!("Ignoring empty notification");
            stats.skipped += 1;
            return;
        }

        debug!(job_id, "Dispatching job");
        match self.runner.run(job_id).await {
            Ok(_) => stats.completed += 1,
            Err(e) => {
                error!(job_id, error = %e, "Ingestion failed");
                stats.failed += 1;
            },
        }
    }
}
