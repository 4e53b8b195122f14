//! Token discovery job
//!
//! Pulls candidate tokens from the external feed and upserts them by symbol.
//! Upserting marks a token active again, which is how tokens deactivated by
//! the retention sweep come back.

use super::{BatchJob, BatchOutcome};
use crate::clock::Clock;
use crate::db::TokenStore;
use crate::error::Result;
use crate::services::discovery::CandidateFeed;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct TokenDiscoveryJob {
    feed: Arc<dyn CandidateFeed>,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl TokenDiscoveryJob {
    pub fn new(
        feed: Arc<dyn CandidateFeed>,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            tokens,
            clock,
            interval,
        }
    }
}

#[async_trait]
impl BatchJob for TokenDiscoveryJob {
    fn name(&self) -> &str {
        "token_discovery"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_once(&self) -> Result<BatchOutcome> {
        let candidates = self.feed.fetch_candidates().await?;
        let now = self.clock.now();
        let mut outcome = BatchOutcome::default();

        for candidate in &candidates {
            match self.tokens.upsert_token(candidate, now).await {
                Ok(()) => {
                    debug!(symbol = %candidate.symbol, "Token discovered");
                    outcome.record(true);
                }
                Err(e) => {
                    warn!(symbol = %candidate.symbol, error = %e, "Failed to upsert token");
                    outcome.record(false);
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MockTokenStore;
    use crate::error::AppError;
    use crate::models::TokenCandidate;
    use crate::services::discovery::StaticFeed;
    use chrono::Utc;

    struct DownFeed;

    #[async_trait]
    impl CandidateFeed for DownFeed {
        async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>> {
            Err(AppError::Upstream("503 Service Unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_upserts_every_candidate() {
        let feed = StaticFeed::new(vec![TokenCandidate::new("FOO"), TokenCandidate::new("BAR")]);

        let mut tokens = MockTokenStore::new();
        tokens.expect_upsert_token().times(2).returning(|candidate, _| {
            if candidate.symbol == "BAR" {
                Err(AppError::Database("constraint violation".into()))
            } else {
                Ok(())
            }
        });

        let job = TokenDiscoveryJob::new(
            Arc::new(feed),
            Arc::new(tokens),
            Arc::new(FixedClock::new(Utc::now())),
            Duration::from_secs(60),
        );
        let outcome = job.run_once().await.unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_invocation() {
        let mut tokens = MockTokenStore::new();
        tokens.expect_upsert_token().never();

        let job = TokenDiscoveryJob::new(
            Arc::new(DownFeed),
            Arc::new(tokens),
            Arc::new(FixedClock::new(Utc::now())),
            Duration::from_secs(60),
        );
        assert!(job.run_once().await.is_err());
    }
}
