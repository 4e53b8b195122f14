/// Database access layer
///
/// The batch jobs talk to persistence only through [`PostStore`] and
/// [`TokenStore`]. Every write is scoped to a single row, so overlapping job
/// runs never need a cross-row lock.
///
/// - `post_repo` / `token_repo`: PostgreSQL implementations (sqlx)
/// - `memory`: in-process implementation for tests and local runs
use crate::error::Result;
use crate::models::{NewPost, Post, ScoredSample, Token, TokenCandidate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod post_repo;
pub mod token_repo;

pub use memory::InMemoryStore;
pub use post_repo::SqlxPostRepository;
pub use token_repo::SqlxTokenRepository;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert posts that are not stored yet; existing ids are left untouched.
    /// Returns the number of rows inserted.
    async fn insert_posts(&self, posts: &[NewPost]) -> Result<u64>;

    /// Oldest posts with no sentiment score, at most `limit`
    async fn find_unscored(&self, limit: i64) -> Result<Vec<Post>>;

    /// Write a post's sentiment score. Re-writing the same score is harmless.
    async fn set_sentiment_score(&self, post_id: &str, score: i16) -> Result<()>;

    /// Scored posts for `symbol` created at or after `since`
    async fn find_scored_since(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScoredSample>>;

    /// Delete every post created before `cutoff`
    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn count_posts(&self, symbol: &str) -> Result<i64>;

    /// Newest posts first
    async fn recent_posts(&self, symbol: &str, limit: i64) -> Result<Vec<Post>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or refresh a token by symbol. Marks it active and bumps
    /// `last_seen_at`; never touches `wom_score`.
    async fn upsert_token(&self, candidate: &TokenCandidate, seen_at: DateTime<Utc>) -> Result<()>;

    /// Up to `limit` active symbols sorted ascending, strictly after
    /// `after`. An empty `after` starts from the first symbol.
    async fn active_symbols_after(&self, after: &str, limit: i64) -> Result<Vec<String>>;

    /// Up to `limit` active symbols, never-collected first, then the ones
    /// collected longest ago
    async fn collection_targets(&self, limit: i64) -> Result<Vec<String>>;

    async fn mark_collected(&self, symbol: &str, collected_at: DateTime<Utc>) -> Result<()>;

    /// Write the derived score; `None` records "no data"
    async fn set_wom_score(&self, symbol: &str, score: Option<f64>) -> Result<()>;

    async fn update_token_stats(
        &self,
        symbol: &str,
        tweet_count: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Deactivate active tokens created and last seen before `cutoff` that
    /// have no post created at or after `cutoff`. Returns the number
    /// deactivated.
    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn get_token(&self, symbol: &str) -> Result<Option<Token>>;
}
