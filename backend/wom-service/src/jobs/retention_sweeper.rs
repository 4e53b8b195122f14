//! Retention sweep job
//!
//! Two independent rules, run on the slowest cadence:
//! 1. deactivate tokens with no post inside the staleness threshold
//!    (`is_active = false`, the token row and its posts stay)
//! 2. delete posts older than the retention horizon, unconditionally
//!
//! One rule failing does not stop the other. The invocation only fails when
//! both rules fail.

use super::{BatchJob, BatchOutcome};
use crate::clock::Clock;
use crate::db::{PostStore, TokenStore};
use crate::error::{AppError, Result};
use crate::metrics::jobs as job_metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Tokens without a post this recent are deactivated
    pub token_stale_after: chrono::Duration,
    /// Posts older than this are deleted
    pub post_retention: chrono::Duration,
    pub interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            token_stale_after: chrono::Duration::hours(24),
            post_retention: chrono::Duration::hours(168),
            interval: Duration::from_secs(3600),
        }
    }
}

/// What one sweep did; `None` marks a rule that failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tokens_deactivated: Option<u64>,
    pub posts_deleted: Option<u64>,
}

impl SweepReport {
    fn outcome(&self) -> BatchOutcome {
        BatchOutcome::from_results([self.tokens_deactivated.is_some(), self.posts_deleted.is_some()])
    }
}

pub struct RetentionSweepJob {
    tokens: Arc<dyn TokenStore>,
    posts: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
    config: RetentionConfig,
}

impl RetentionSweepJob {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        posts: Arc<dyn PostStore>,
        clock: Arc<dyn Clock>,
        config: RetentionConfig,
    ) -> Self {
        Self {
            tokens,
            posts,
            clock,
            config,
        }
    }

    /// Run both rules once
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();

        let stale_cutoff = now - self.config.token_stale_after;
        let tokens_deactivated = match self.tokens.deactivate_stale(stale_cutoff).await {
            Ok(count) => {
                job_metrics::record_tokens_deactivated(count);
                Some(count)
            }
            Err(e) => {
                error!(error = %e, cutoff = %stale_cutoff, "Failed to deactivate stale tokens");
                None
            }
        };

        let retention_cutoff = now - self.config.post_retention;
        let posts_deleted = match self.posts.delete_posts_before(retention_cutoff).await {
            Ok(count) => {
                job_metrics::record_posts_deleted(count);
                Some(count)
            }
            Err(e) => {
                error!(error = %e, cutoff = %retention_cutoff, "Failed to delete expired posts");
                None
            }
        };

        info!(
            tokens_deactivated = ?tokens_deactivated,
            posts_deleted = ?posts_deleted,
            "Retention sweep finished"
        );

        SweepReport {
            tokens_deactivated,
            posts_deleted,
        }
    }
}

#[async_trait]
impl BatchJob for RetentionSweepJob {
    fn name(&self) -> &str {
        "retention_sweep"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    async fn run_once(&self) -> Result<BatchOutcome> {
        let report = self.sweep().await;

        if report.tokens_deactivated.is_none() && report.posts_deleted.is_none() {
            return Err(AppError::Database(
                "both retention rules failed".to_string(),
            ));
        }

        Ok(report.outcome())
    }
}
