//! WOM recompute job
//!
//! For every active token, reads the scored posts inside the aggregation
//! window, runs the decay-weighted aggregator and writes the token score.
//! This is the only writer of `tokens.wom_score`.
//!
//! Active tokens are walked in symbol order, `token_cap` per page, so one
//! invocation covers all of them regardless of how many there are.

use super::{BatchJob, BatchOutcome};
use crate::clock::Clock;
use crate::db::{PostStore, TokenStore};
use crate::error::Result;
use crate::services::wom_score::{aggregate, DecayParams};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct WomRecomputeConfig {
    pub decay: DecayParams,
    /// Active tokens selected per page
    pub token_cap: i64,
    pub concurrency: usize,
    pub interval: Duration,
}

impl Default for WomRecomputeConfig {
    fn default() -> Self {
        Self {
            decay: DecayParams::default(),
            token_cap: 1000,
            concurrency: 8,
            interval: Duration::from_secs(600),
        }
    }
}

pub struct WomRecomputeJob {
    tokens: Arc<dyn TokenStore>,
    posts: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
    config: WomRecomputeConfig,
}

impl WomRecomputeJob {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        posts: Arc<dyn PostStore>,
        clock: Arc<dyn Clock>,
        config: WomRecomputeConfig,
    ) -> Self {
        Self {
            tokens,
            posts,
            clock,
            config,
        }
    }

    /// Recompute and store one token's score now.
    ///
    /// Returns the stored value; `None` means no scored post is in window.
    pub async fn recompute_token(&self, symbol: &str) -> Result<Option<f64>> {
        self.recompute_at(symbol, self.clock.now()).await
    }

    async fn recompute_at(&self, symbol: &str, now: DateTime<Utc>) -> Result<Option<f64>> {
        let decay = &self.config.decay;
        let samples = self
            .posts
            .find_scored_since(symbol, decay.window_start(now))
            .await?;

        let score = aggregate(&samples, now, decay);
        self.tokens.set_wom_score(symbol, score).await?;

        debug!(symbol, samples = samples.len(), wom_score = ?score, "WOM score updated");
        Ok(score)
    }

    async fn recompute_page(&self, symbols: Vec<String>, now: DateTime<Utc>) -> Vec<bool> {
        stream::iter(symbols)
            .map(|symbol| async move {
                match self.recompute_at(&symbol, now).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "Failed to recompute WOM score");
                        false
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}

#[async_trait]
impl BatchJob for WomRecomputeJob {
    fn name(&self) -> &str {
        "wom_recompute"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    async fn run_once(&self) -> Result<BatchOutcome> {
        let page_size = self.config.token_cap.max(1);
        let now = self.clock.now();
        let mut outcome = BatchOutcome::default();
        let mut after = String::new();

        loop {
            let page = self.tokens.active_symbols_after(&after, page_size).await?;
            let Some(last) = page.last().cloned() else {
                break;
            };
            let full_page = page.len() as i64 >= page_size;

            for ok in self.recompute_page(page, now).await {
                outcome.record(ok);
            }

            if !full_page {
                break;
            }
            after = last;
        }

        Ok(outcome)
    }
}
