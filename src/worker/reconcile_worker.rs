use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::reconciler::{JobReconciler, ReconcileReport};

/// Background worker that sweeps expired jobs on a fixed period
pub struct ReconcileWorker {
    reconciler: Arc<JobReconciler>,
    interval: Duration,
    jitter: Duration,
}

impl ReconcileWorker {
    /// Create a new ReconcileWorker using the reconciler's configured period
    pub fn new(reconciler: Arc<JobReconciler>) -> Self {
        let interval = reconciler.config().interval;
        let jitter = reconciler.config().jitter;
        Self {
            reconciler,
            interval,
            jitter,
        }
    }

    /// Run sweeps until shutdown is signalled
    ///
    /// # Schedule
    /// - First sweep one interval after start, plus a random delay up to `jitter`
    /// - Then every interval; a late tick delays the following ones instead of bursting
    /// - A failed sweep is logged and the next tick runs as usual
    ///
    /// # Arguments
    /// - `shutdown_rx` - Flips to `true` when the process is shutting down
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let delay = self.interval + self.random_jitter();
        info!(
            "Reconcile worker started: every {:?}, first sweep in {:?}",
            self.interval, delay
        );

        let mut ticker = interval_at(Instant::now() + delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reconcile worker stopped");
    }

    /// Run a single sweep and log its outcome
    pub async fn run_once(&self) -> Option<ReconcileReport> {
        match self.reconciler.reconcile().await {
            Ok(report) => {
                info!(
                    "Background task: checked expired jobs, {} archived",
                    report.archived
                );
                Some(report)
            }
            Err(e) => {
                error!(
                    "Background task error ({} archived before failure): {}",
                    e.archived(),
                    e
                );
                None
            }
        }
    }

    fn random_jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
