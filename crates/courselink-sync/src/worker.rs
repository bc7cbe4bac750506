//! Periodic sync worker.
//!
//! Drives the global reconciliation on a fixed interval as the correctness
//! backstop behind the event-triggered entry points. Failures are logged
//! and the loop keeps ticking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, instrument};

use crate::engine::SyncEngine;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Seconds between global reconciliation runs.
    pub interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

/// Background worker running the periodic global sync.
pub struct SyncWorker {
    engine: Arc<SyncEngine>,
    config: WorkerConfig,
    shutdown: Arc<AtomicBool>,
}

impl SyncWorker {
    /// Create a worker over a shared engine.
    #[must_use]
    pub fn new(engine: Arc<SyncEngine>, config: WorkerConfig) -> Self {
        Self {
            engine,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until shutdown is requested. One global reconciliation per tick.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval_secs,
            "Starting periodic sync worker"
        );

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Worker shutdown requested, stopping");
                break;
            }

            match self.engine.sync_instances(None).await {
                Ok(outcome) => {
                    if outcome.is_disabled() {
                        info!("Sync disabled, periodic run skipped");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Periodic sync run failed");
                }
            }
        }
    }

    /// Request graceful shutdown; the loop exits on its next tick.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.interval_secs, 600);
    }
}
