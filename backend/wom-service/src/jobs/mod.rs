//! Background batch jobs
//!
//! Every runner is a [`BatchJob`]: one no-argument `run_once` that handles a
//! bounded slice of work and reports how many items it processed and how many
//! failed. [`run_job_loop`] drives a job on its own fixed cadence.
//!
//! - Per-item failures are logged and counted, never propagated
//! - A failed selection query aborts the invocation; the next tick is the retry
//! - Jobs share no locks; overlapping runs only ever rewrite identical values

use crate::error::Result;
use crate::metrics::jobs as job_metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub mod post_collector;
pub mod retention_sweeper;
pub mod sentiment_batch;
pub mod token_discovery;
pub mod wom_recompute;

pub use post_collector::{PostCollectorConfig, PostCollectorJob};
pub use retention_sweeper::{RetentionConfig, RetentionSweepJob, SweepReport};
pub use sentiment_batch::{SentimentBatchConfig, SentimentBatchJob};
pub use token_discovery::TokenDiscoveryJob;
pub use wom_recompute::{WomRecomputeConfig, WomRecomputeJob};

/// Result of one job invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl BatchOutcome {
    pub fn record(&mut self, ok: bool) {
        self.processed += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Tally a sequence of per-item results
    pub fn from_results<I: IntoIterator<Item = bool>>(results: I) -> Self {
        let mut outcome = Self::default();
        for ok in results {
            outcome.record(ok);
        }
        outcome
    }
}

#[async_trait]
pub trait BatchJob: Send + Sync {
    /// Stable name used in logs and metric labels
    fn name(&self) -> &str;

    fn interval(&self) -> Duration;

    async fn run_once(&self) -> Result<BatchOutcome>;
}

/// Run a single invocation with logging and metrics
pub async fn run_and_record(job: &dyn BatchJob) -> Result<BatchOutcome> {
    let start = Instant::now();
    let result = job.run_once().await;
    let elapsed = start.elapsed();

    job_metrics::record_job_duration(job.name(), elapsed);

    match &result {
        Ok(outcome) => {
            job_metrics::record_job_run(job.name(), "success");
            job_metrics::record_job_items(job.name(), outcome.succeeded, outcome.failed);

            if outcome.failed > 0 {
                warn!(
                    job = %job.name(),
                    processed = outcome.processed,
                    failed = outcome.failed,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job completed with item failures"
                );
            } else if outcome.processed > 0 {
                info!(
                    job = %job.name(),
                    processed = outcome.processed,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job completed"
                );
            } else {
                debug!(job = %job.name(), "Job completed, nothing to do");
            }
        }
        Err(e) => {
            job_metrics::record_job_run(job.name(), "error");
            error!(
                job = %job.name(),
                error = %e,
                store_failure = e.is_store_failure(),
                duration_ms = elapsed.as_millis() as u64,
                "Job invocation failed, will retry on next interval"
            );
        }
    }

    result
}

/// Drive one job on its fixed interval until shutdown is broadcast.
///
/// The first invocation happens immediately. A run that overruns its
/// interval delays the next tick instead of bursting to catch up.
pub async fn run_job_loop(job: Arc<dyn BatchJob>, mut shutdown: broadcast::Receiver<()>) {
    let period = job.interval().max(Duration::from_millis(1));
    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        job = %job.name(),
        interval_sec = period.as_secs(),
        "Starting job loop"
    );

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {
                let _ = run_and_record(job.as_ref()).await;
            }
            _ = shutdown.recv() => {
                info!(job = %job.name(), "Received shutdown signal, stopping job loop");
                break;
            }
        }
    }

    info!(job = %job.name(), "Job loop stopped");
}

/// Spawn one loop per job and wait for all of them to stop
pub async fn run_jobs(jobs: Vec<Arc<dyn BatchJob>>, shutdown: broadcast::Sender<()>) {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(run_job_loop(job, shutdown_rx))
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Job task panicked");
        }
    }
}
