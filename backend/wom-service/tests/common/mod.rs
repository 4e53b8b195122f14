//! Shared fixtures for wom-service integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use wom_service::db::{InMemoryStore, PostStore, TokenStore};
use wom_service::models::{NewPost, Post, ScoredSample, Token, TokenCandidate};
use wom_service::{AppError, FixedClock, Result};

/// Fixed reference instant so decay math is reproducible
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn clock_at(instant: DateTime<Utc>) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(instant))
}

pub fn post(id: &str, symbol: &str, text: &str, created_at: DateTime<Utc>) -> NewPost {
    NewPost::new(id, symbol, text, created_at)
}

/// A stored post that already carries a score
pub fn scored_post(id: &str, symbol: &str, score: i16, created_at: DateTime<Utc>) -> Post {
    Post {
        post_id: id.to_string(),
        token_symbol: symbol.to_string(),
        text: None,
        author: None,
        followers_count: 0,
        url: None,
        sentiment_score: Some(score),
        created_at,
    }
}

pub async fn seed_token(store: &InMemoryStore, symbol: &str, created_at: DateTime<Utc>) {
    store
        .upsert_token(&TokenCandidate::new(symbol), created_at)
        .await
        .expect("seed token");
}

pub fn hours(h: i64) -> Duration {
    Duration::hours(h)
}

/// Store double that rejects writes for chosen post ids and token symbols,
/// and can fail every selection query. Everything else is delegated to an
/// [`InMemoryStore`].
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    failing_posts: HashSet<String>,
    failing_tokens: HashSet<String>,
    selection_down: bool,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_post(mut self, post_id: &str) -> Self {
        self.failing_posts.insert(post_id.to_string());
        self
    }

    pub fn fail_token(mut self, symbol: &str) -> Self {
        self.failing_tokens.insert(symbol.to_string());
        self
    }

    pub fn selection_down(mut self) -> Self {
        self.selection_down = true;
        self
    }

    fn check_selection(&self) -> Result<()> {
        if self.selection_down {
            return Err(AppError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for FlakyStore {
    async fn insert_posts(&self, posts: &[NewPost]) -> Result<u64> {
        self.inner.insert_posts(posts).await
    }

    async fn find_unscored(&self, limit: i64) -> Result<Vec<Post>> {
        self.check_selection()?;
        self.inner.find_unscored(limit).await
    }

    async fn set_sentiment_score(&self, post_id: &str, score: i16) -> Result<()> {
        if self.failing_posts.contains(post_id) {
            return Err(AppError::Database(format!("write rejected for {}", post_id)));
        }
        self.inner.set_sentiment_score(post_id, score).await
    }

    async fn find_scored_since(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScoredSample>> {
        self.inner.find_scored_since(symbol, since).await
    }

    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check_selection()?;
        self.inner.delete_posts_before(cutoff).await
    }

    async fn count_posts(&self, symbol: &str) -> Result<i64> {
        self.inner.count_posts(symbol).await
    }

    async fn recent_posts(&self, symbol: &str, limit: i64) -> Result<Vec<Post>> {
        self.inner.recent_posts(symbol, limit).await
    }
}

#[async_trait]
impl TokenStore for FlakyStore {
    async fn upsert_token(&self, candidate: &TokenCandidate, seen_at: DateTime<Utc>) -> Result<()> {
        self.inner.upsert_token(candidate, seen_at).await
    }

    async fn active_symbols_after(&self, after: &str, limit: i64) -> Result<Vec<String>> {
        self.check_selection()?;
        self.inner.active_symbols_after(after, limit).await
    }

    async fn collection_targets(&self, limit: i64) -> Result<Vec<String>> {
        self.check_selection()?;
        self.inner.collection_targets(limit).await
    }

    async fn mark_collected(&self, symbol: &str, collected_at: DateTime<Utc>) -> Result<()> {
        self.inner.mark_collected(symbol, collected_at).await
    }

    async fn set_wom_score(&self, symbol: &str, score: Option<f64>) -> Result<()> {
        if self.failing_tokens.contains(symbol) {
            return Err(AppError::Database(format!("write rejected for {}", symbol)));
        }
        self.inner.set_wom_score(symbol, score).await
    }

    async fn update_token_stats(
        &self,
        symbol: &str,
        tweet_count: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        self.inner.update_token_stats(symbol, tweet_count, seen_at).await
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check_selection()?;
        self.inner.deactivate_stale(cutoff).await
    }

    async fn get_token(&self, symbol: &str) -> Result<Option<Token>> {
        self.inner.get_token(symbol).await
    }
}
