/// Data models for wom-service
///
/// Rows map 1:1 onto the `tokens` and `token_posts` tables.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored social post about a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub post_id: String,
    pub token_symbol: String,
    pub text: Option<String>,
    pub author: Option<String>,
    pub followers_count: i64,
    pub url: Option<String>,
    /// Per-post sentiment in [0,100]; `None` until the sentiment job runs
    pub sentiment_score: Option<i16>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_scored(&self) -> bool {
        self.sentiment_score.is_some()
    }
}

/// A post as delivered by a [`PostSource`](crate::services::discovery::PostSource),
/// before it has been stored or scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub post_id: String,
    pub token_symbol: String,
    pub text: Option<String>,
    pub author: Option<String>,
    pub followers_count: i64,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// Minimal post with only the fields the pipeline reads
    pub fn new(
        post_id: impl Into<String>,
        token_symbol: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            token_symbol: token_symbol.into(),
            text: Some(text.into()),
            author: None,
            followers_count: 0,
            url: None,
            created_at,
        }
    }
}

/// A tracked token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub token_symbol: String,
    pub token_name: Option<String>,
    pub address: Option<String>,
    pub volume_usd: f64,
    pub liquidity_usd: f64,
    pub market_cap_usd: f64,
    pub dex_url: Option<String>,
    pub price_change_1h: f64,
    pub launchpad: Option<String>,
    /// Decay-weighted mean sentiment; `None` when no scored posts are in window
    pub wom_score: Option<f64>,
    pub tweet_count: i64,
    pub is_active: bool,
    pub last_seen_at: DateTime<Utc>,
    /// Last post-collector poll; `None` until the token is first polled
    pub last_collected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Score for outward-facing summaries, where "no data" renders as 0
    pub fn display_wom_score(&self) -> f64 {
        self.wom_score.unwrap_or(0.0)
    }

    pub fn has_wom_data(&self) -> bool {
        self.wom_score.is_some()
    }
}

/// Token record produced by the discovery feed, keyed by symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCandidate {
    pub symbol: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub volume_usd: f64,
    pub liquidity_usd: f64,
    pub market_cap_usd: f64,
    pub dex_url: Option<String>,
    pub price_change_1h: f64,
    pub launchpad: Option<String>,
}

impl TokenCandidate {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            address: None,
            volume_usd: 0.0,
            liquidity_usd: 0.0,
            market_cap_usd: 0.0,
            dex_url: None,
            price_change_1h: 0.0,
            launchpad: None,
        }
    }
}

/// One scored post as seen by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredSample {
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl ScoredSample {
    pub fn new(score: f64, created_at: DateTime<Utc>) -> Self {
        Self { score, created_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_score_maps_missing_to_zero() {
        let now = Utc::now();
        let mut token = Token {
            token_symbol: "FOO".to_string(),
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
            last_seen_at: now,
            last_collected_at: None,
            created_at: now,
        };

        assert_eq!(token.display_wom_score(), 0.0);
        assert!(!token.has_wom_data());

        token.wom_score = Some(0.0);
        assert_eq!(token.display_wom_score(), 0.0);
        assert!(token.has_wom_data());
    }
}
