//! In-process store implementing both [`PostStore`] and [`TokenStore`].
//!
//! Mirrors the PostgreSQL semantics closely enough to drive the jobs in tests
//! and in `store = "memory"` local runs. Clones share state.

use super::{PostStore, TokenStore};
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, ScoredSample, Token, TokenCandidate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    posts: HashMap<String, Post>,
    tokens: HashMap<String, Token>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a post as-is, replacing any post with the same id
    pub fn put_post(&self, post: Post) {
        self.lock().posts.insert(post.post_id.clone(), post);
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.lock().posts.get(post_id).cloned()
    }

    pub fn token(&self, symbol: &str) -> Option<Token> {
        self.lock().tokens.get(symbol).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn insert_posts(&self, posts: &[NewPost]) -> Result<u64> {
        let mut state = self.lock();
        let mut inserted = 0;

        for post in posts {
            if state.posts.contains_key(&post.post_id) {
                continue;
            }
            state.posts.insert(
                post.post_id.clone(),
                Post {
                    post_id: post.post_id.clone(),
                    token_symbol: post.token_symbol.clone(),
                    text: post.text.clone(),
                    author: post.author.clone(),
                    followers_count: post.followers_count,
                    url: post.url.clone(),
                    sentiment_score: None,
                    created_at: post.created_at,
                },
            );
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn find_unscored(&self, limit: i64) -> Result<Vec<Post>> {
        let state = self.lock();
        let mut unscored: Vec<Post> = state
            .posts
            .values()
            .filter(|post| !post.is_scored())
            .cloned()
            .collect();

        unscored.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.post_id.cmp(&b.post_id))
        });
        unscored.truncate(limit.max(0) as usize);

        Ok(unscored)
    }

    async fn set_sentiment_score(&self, post_id: &str, score: i16) -> Result<()> {
        let mut state = self.lock();
        let post = state
            .posts
            .get_mut(post_id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;
        post.sentiment_score = Some(score);
        Ok(())
    }

    async fn find_scored_since(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScoredSample>> {
        let state = self.lock();
        Ok(state
            .posts
            .values()
            .filter(|post| post.token_symbol == symbol && post.created_at >= since)
            .filter_map(|post| {
                post.sentiment_score
                    .map(|score| ScoredSample::new(f64::from(score), post.created_at))
            })
            .collect())
    }

    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.lock();
        let before = state.posts.len();
        state.posts.retain(|_, post| post.created_at >= cutoff);
        Ok((before - state.posts.len()) as u64)
    }

    async fn count_posts(&self, symbol: &str) -> Result<i64> {
        let state = self.lock();
        Ok(state
            .posts
            .values()
            .filter(|post| post.token_symbol == symbol)
            .count() as i64)
    }

    async fn recent_posts(&self, symbol: &str, limit: i64) -> Result<Vec<Post>> {
        let state = self.lock();
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.token_symbol == symbol)
            .cloned()
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn upsert_token(&self, candidate: &TokenCandidate, seen_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.lock();
        let token = state
            .tokens
            .entry(candidate.symbol.clone())
            .or_insert_with(|| Token {
                token_symbol: candidate.symbol.clone(),
                token_name: None,
                address: None,
                volume_usd: 0.0,
                liquidity_usd: 0.0,
                market_cap_usd: 0.0,
                dex_url: None,
                price_change_1h: 0.0,
                launchpad: None,
                wom_score: None,
                tweet_count: 0,
                is_active: true,
                last_seen_at: seen_at,
                last_collected_at: None,
                created_at: seen_at,
            });

        token.token_name = candidate.name.clone();
        token.address = candidate.address.clone();
        token.volume_usd = candidate.volume_usd;
        token.liquidity_usd = candidate.liquidity_usd;
        token.market_cap_usd = candidate.market_cap_usd;
        token.dex_url = candidate.dex_url.clone();
        token.price_change_1h = candidate.price_change_1h;
        token.launchpad = candidate.launchpad.clone();
        token.is_active = true;
        token.last_seen_at = seen_at;

        Ok(())
    }

    async fn active_symbols_after(&self, after: &str, limit: i64) -> Result<Vec<String>> {
        let state = self.lock();
        let mut symbols: Vec<String> = state
            .tokens
            .values()
            .filter(|t| t.is_active && t.token_symbol.as_str() > after)
            .map(|t| t.token_symbol.clone())
            .collect();

        symbols.sort();
        symbols.truncate(limit.max(0) as usize);
        Ok(symbols)
    }

    async fn collection_targets(&self, limit: i64) -> Result<Vec<String>> {
        let state = self.lock();
        let mut active: Vec<&Token> = state.tokens.values().filter(|t| t.is_active).collect();
        // None sorts before Some: never-collected tokens come first
        active.sort_by(|a, b| {
            a.last_collected_at
                .cmp(&b.last_collected_at)
                .then_with(|| a.token_symbol.cmp(&b.token_symbol))
        });

        Ok(active
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|t| t.token_symbol.clone())
            .collect())
    }

    async fn mark_collected(&self, symbol: &str, collected_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.lock();
        if let Some(token) = state.tokens.get_mut(symbol) {
            token.last_collected_at = Some(collected_at);
        }
        Ok(())
    }

    async fn set_wom_score(&self, symbol: &str, score: Option<f64>) -> Result<()> {
        let mut state = self.lock();
        let token = state
            .tokens
            .get_mut(symbol)
            .ok_or_else(|| AppError::NotFound(format!("token {}", symbol)))?;
        token.wom_score = score;
        Ok(())
    }

    async fn update_token_stats(
        &self,
        symbol: &str,
        tweet_count: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.lock();
        if let Some(token) = state.tokens.get_mut(symbol) {
            token.tweet_count = tweet_count;
            token.last_seen_at = token.last_seen_at.max(seen_at);
        }
        Ok(())
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.lock();
        let State { posts, tokens } = &mut *state;
        let mut deactivated = 0;

        for token in tokens.values_mut() {
            if !token.is_active || token.created_at >= cutoff || token.last_seen_at >= cutoff {
                continue;
            }

            let recent_activity = posts
                .values()
                .any(|post| post.token_symbol == token.token_symbol && post.created_at >= cutoff);

            if !recent_activity {
                token.is_active = false;
                deactivated += 1;
            }
        }

        Ok(deactivated)
    }

    async fn get_token(&self, symbol: &str) -> Result<Option<Token>> {
        Ok(self.token(symbol))
    }
}
