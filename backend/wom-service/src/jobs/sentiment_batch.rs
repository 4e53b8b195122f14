//! Sentiment batch job
//!
//! Pulls the oldest unscored posts (at most `batch_cap`), scores each with
//! the keyword scorer and writes the score back post by post. Scoring is
//! deterministic, so a post picked up by two overlapping runs is simply
//! written twice with the same value.

use super::{BatchJob, BatchOutcome};
use crate::db::PostStore;
use crate::error::Result;
use crate::metrics::jobs as job_metrics;
use crate::models::Post;
use crate::services::sentiment::{score_with, KeywordTable};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SentimentBatchConfig {
    /// Maximum posts selected per invocation
    pub batch_cap: i64,
    /// Posts scored and written concurrently
    pub concurrency: usize,
    pub interval: Duration,
}

impl Default for SentimentBatchConfig {
    fn default() -> Self {
        Self {
            batch_cap: 50,
            concurrency: 8,
            interval: Duration::from_secs(300),
        }
    }
}

pub struct SentimentBatchJob {
    posts: Arc<dyn PostStore>,
    keywords: KeywordTable,
    config: SentimentBatchConfig,
}

impl SentimentBatchJob {
    pub fn new(posts: Arc<dyn PostStore>, config: SentimentBatchConfig) -> Self {
        Self {
            posts,
            keywords: KeywordTable::DEFAULT,
            config,
        }
    }

    async fn score_post(&self, post: Post) -> bool {
        let score = score_with(&self.keywords, post.text.as_deref());

        match self
            .posts
            .set_sentiment_score(&post.post_id, i16::from(score))
            .await
        {
            Ok(()) => {
                debug!(post_id = %post.post_id, symbol = %post.token_symbol, score, "Post scored");
                true
            }
            Err(e) => {
                warn!(post_id = %post.post_id, error = %e, "Failed to store sentiment score");
                false
            }
        }
    }
}

#[async_trait]
impl BatchJob for SentimentBatchJob {
    fn name(&self) -> &str {
        "sentiment_batch"
    }

    fn interval(&self) -> Duration {
        self.config.interval
    }

    async fn run_once(&self) -> Result<BatchOutcome> {
        let batch = self.posts.find_unscored(self.config.batch_cap).await?;
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let results: Vec<bool> = stream::iter(batch)
            .map(|post| self.score_post(post))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let outcome = BatchOutcome::from_results(results);
        job_metrics::record_posts_scored(outcome.succeeded);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockPostStore;
    use crate::error::AppError;
    use chrono::Utc;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn unscored(id: &str, text: Option<&str>) -> Post {
        Post {
            post_id: id.to_string(),
            token_symbol: "FOO".to_string(),
            text: text.map(str::to_string),
            author: None,
            followers_count: 0,
            url: None,
            sentiment_score: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_scores_every_selected_post() {
        let mut store = MockPostStore::new();
        store.expect_find_unscored().with(eq(50)).times(1).returning(|_| {
            Ok(vec![
                unscored("p1", Some("total scam, pure rug")),
                unscored("p2", None),
            ])
        });

        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = written.clone();
        store
            .expect_set_sentiment_score()
            .times(2)
            .returning(move |id, score| {
                sink.lock().unwrap().push((id.to_string(), score));
                Ok(())
            });

        let job = SentimentBatchJob::new(Arc::new(store), SentimentBatchConfig::default());
        let outcome = job.run_once().await.unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed, 0);

        let mut written = written.lock().unwrap().clone();
        written.sort();
        assert_eq!(
            written,
            vec![("p1".to_string(), 20), ("p2".to_string(), 50)]
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_counted_not_fatal() {
        let mut store = MockPostStore::new();
        store.expect_find_unscored().returning(|_| {
            Ok(vec![
                unscored("ok-1", Some("bullish")),
                unscored("bad", Some("bullish")),
                unscored("ok-2", Some("bullish")),
            ])
        });
        store.expect_set_sentiment_score().returning(|id, _| {
            if id == "bad" {
                Err(AppError::Database("write rejected".into()))
            } else {
                Ok(())
            }
        });

        let job = SentimentBatchJob::new(Arc::new(store), SentimentBatchConfig::default());
        let outcome = job.run_once().await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome {
                processed: 3,
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_selection_failure_aborts_invocation() {
        let mut store = MockPostStore::new();
        store
            .expect_find_unscored()
            .returning(|_| Err(AppError::Database("connection refused".into())));
        store.expect_set_sentiment_score().never();

        let job = SentimentBatchJob::new(Arc::new(store), SentimentBatchConfig::default());
        assert!(job.run_once().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let mut store = MockPostStore::new();
        store.expect_find_unscored().returning(|_| Ok(vec![]));

        let job = SentimentBatchJob::new(Arc::new(store), SentimentBatchConfig::default());
        assert_eq!(job.run_once().await.unwrap(), BatchOutcome::default());
    }
}
