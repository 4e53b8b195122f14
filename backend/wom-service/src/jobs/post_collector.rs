//! Post collector job
//!
//! For the active tokens polled longest ago, fetches fresh posts from the
//! post source, drops spam via the relevance filter and stores the rest
//! unscored. Already stored posts are never rewritten.
//!
//! Every selected token is marked collected, even when its poll failed, so
//! the next invocation moves on to the tokens after it.

use super::{BatchJob, BatchOutcome};
use crate::clock::Clock;
use crate::db::{PostStore, TokenStore};
use crate::error::Result;
use crate::models::NewPost;
use crate::services::discovery::PostSource;
use crate::services::relevance;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PostCollectorConfig {
    /// Active tokens polled per invocation
    pub token_cap: i64,
    pub relevance_filter: bool,
    pub interval: Duration,
}

impl Default for PostCollectorConfig {
    fn default() -> Self {
        Self {
            token_cap: 10,
            relevance_filter: true,
            interval: Duration::from_secs(120),
        }
    }
}

pub struct PostCollectorJob {
    source: Arc<dyn PostSource>,
    posts: Arc<dyn PostStore>,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    config: PostCollectorConfig,
}

impl PostCollectorJob {
    pub fn new(
        source: Arc<dyn PostSource>,
        posts: Arc<dyn PostStore>,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        config: PostCollectorConfig,
    ) -> Self {
        Self {
            source,
            posts,
            tokens,
            clock,
            config,
        }
    }

    fn keep(&self, post: &NewPost) -> bool {
        if !self.config.relevance_filter {
            return true;
        }

        match relevance::rejection_reason(post.text.as_deref().unwrap_or_default()) {
            Some(rule) => {
                debug!(post_id = %post.post_id, rule, "Post filtered as irrelevant");
                false
            }
            None => true,
        }
    }

    async fn collect(&self, symbol: &str) -> Result<u64> {
        let fetched = self.source.fetch_posts(symbol).await?;
        let fetched_count = fetched.len();

        let relevant: Vec<NewPost> = fetched.into_iter().filter(|p| self.keep(p)).collect();
        let inserted = self.posts.insert_posts(&relevant).await?;

        if let Some(latest) = relevant.iter().map(|p| p.created_at).max() {
            let tweet_count = self.posts.count_posts(symbol).await?;
            self.tokens
                .update_token_stats(symbol, tweet_count, latest)
                .await?;
        }

        debug!(
            symbol,
            fetched = fetched_count,
            relevant = relevant.len(),
            inserted,
            "Posts collected"
        );
        Ok(inserted)
    }
}

#[async_trait]
impl BatchJob for PostCollectorJob {
    fn name(&self) -> &str {
        "post_collector"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    async fn run_once(&self) -> Result<BatchOutcome> {
        let symbols = self.tokens.collection_targets(self.config.token_cap).await?;
        let now = self.clock.now();
        let mut outcome = BatchOutcome::default();

        for symbol in &symbols {
            let mut ok = match self.collect(symbol).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Failed to collect posts");
                    false
                }
            };

            if let Err(e) = self.tokens.mark_collected(symbol, now).await {
                warn!(symbol = %symbol, error = %e, "Failed to mark token collected");
                ok = false;
            }

            outcome.record(ok);
        }

        Ok(outcome)
    }
}
