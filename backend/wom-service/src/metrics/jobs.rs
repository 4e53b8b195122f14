//! Prometheus metrics for the batch jobs
//!
//! Tracks invocations, per-item outcomes and the side effects of each runner.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::time::Duration;

/// Total number of job invocations (success/error)
static JOB_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wom_job_runs_total",
        "Total number of batch job invocations (success/error)",
        &["job", "status"]
    )
    .expect("failed to register wom_job_runs_total")
});

/// Duration of job invocations
static JOB_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "wom_job_duration_seconds",
        "Duration of batch job invocations",
        &["job"],
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register wom_job_duration_seconds")
});

/// Items handled per job, split by outcome (succeeded/failed)
static JOB_ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wom_job_items_total",
        "Total items handled by batch jobs",
        &["job", "outcome"]
    )
    .expect("failed to register wom_job_items_total")
});

static POSTS_SCORED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("wom_posts_scored_total", "Total posts assigned a sentiment score")
        .expect("failed to register wom_posts_scored_total")
});

static TOKENS_DEACTIVATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wom_tokens_deactivated_total",
        "Total tokens deactivated by the retention sweep"
    )
    .expect("failed to register wom_tokens_deactivated_total")
});

static POSTS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wom_posts_deleted_total",
        "Total posts deleted by the retention sweep"
    )
    .expect("failed to register wom_posts_deleted_total")
});

/// Record a job invocation
pub fn record_job_run(job: &str, status: &str) {
    JOB_RUNS_TOTAL.with_label_values(&[job, status]).inc();
}

pub fn record_job_duration(job: &str, duration: Duration) {
    JOB_DURATION_SECONDS
        .with_label_values(&[job])
        .observe(duration.as_secs_f64());
}

/// Record per-item outcomes of one invocation
pub fn record_job_items(job: &str, succeeded: u64, failed: u64) {
    JOB_ITEMS_TOTAL
        .with_label_values(&[job, "succeeded"])
        .inc_by(succeeded);
    JOB_ITEMS_TOTAL
        .with_label_values(&[job, "failed"])
        .inc_by(failed);
}

pub fn record_posts_scored(count: u64) {
    POSTS_SCORED_TOTAL.inc_by(count);
}

pub fn record_tokens_deactivated(count: u64) {
    TOKENS_DEACTIVATED_TOTAL.inc_by(count);
}

pub fn record_posts_deleted(count: u64) {
    POSTS_DELETED_TOTAL.inc_by(count);
}
