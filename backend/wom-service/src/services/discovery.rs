//! External feeds: token discovery and post sources
//!
//! Both feeds are non-deterministic collaborators, so the jobs only see the
//! [`CandidateFeed`] and [`PostSource`] traits. Tests plug in the static
//! implementations.

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{NewPost, TokenCandidate};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const DEX_SCREENER_LAUNCHPAD: &str = "DEX_SCREENER";
const DEX_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CANDIDATES: usize = 50;

/// Source of token records to upsert
#[async_trait]
pub trait CandidateFeed: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>>;
}

/// Source of fresh posts mentioning a token
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self, symbol: &str) -> Result<Vec<NewPost>>;
}

// ============================================
// DEX Screener
// ============================================

#[derive(Debug, Deserialize)]
struct DexResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    base_token: DexBaseToken,
    #[serde(default)]
    volume: Option<DexWindowed>,
    #[serde(default)]
    liquidity: Option<DexLiquidity>,
    #[serde(default)]
    market_cap: Option<Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    price_change: Option<DexWindowed>,
}

#[derive(Debug, Deserialize)]
struct DexBaseToken {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DexWindowed {
    #[serde(default)]
    h1: Option<Value>,
    #[serde(default)]
    h24: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DexLiquidity {
    #[serde(default)]
    usd: Option<Value>,
}

/// DEX Screener reports numbers either as JSON numbers or numeric strings
fn lenient_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl From<DexPair> for TokenCandidate {
    fn from(pair: DexPair) -> Self {
        Self {
            symbol: pair.base_token.symbol,
            name: pair.base_token.name,
            address: pair.base_token.address,
            volume_usd: lenient_f64(pair.volume.as_ref().and_then(|v| v.h24.as_ref())),
            liquidity_usd: lenient_f64(pair.liquidity.as_ref().and_then(|l| l.usd.as_ref())),
            market_cap_usd: lenient_f64(pair.market_cap.as_ref()),
            dex_url: pair.url,
            price_change_1h: lenient_f64(pair.price_change.as_ref().and_then(|p| p.h1.as_ref())),
            launchpad: Some(DEX_SCREENER_LAUNCHPAD.to_string()),
        }
    }
}

fn parse_dex_response(body: DexResponse) -> Vec<TokenCandidate> {
    body.pairs
        .unwrap_or_default()
        .into_iter()
        .filter(|pair| !pair.base_token.symbol.trim().is_empty())
        .take(MAX_CANDIDATES)
        .map(TokenCandidate::from)
        .collect()
}

/// Trending-pairs feed from DEX Screener
pub struct DexScreenerFeed {
    client: reqwest::Client,
    url: String,
}

impl DexScreenerFeed {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEX_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CandidateFeed for DexScreenerFeed {
    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>> {
        let body: DexResponse = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candidates = parse_dex_response(body);
        debug!(count = candidates.len(), "Fetched DEX Screener candidates");
        Ok(candidates)
    }
}

// ============================================
// Synthetic posts (development)
// ============================================

const POST_TEMPLATES: &[&str] = &[
    "Just discovered ${symbol}, the chart looks strong and holders keep growing",
    "${symbol} is mooning, do not miss out on this gem 💎",
    "Not sure about ${symbol}, volume is dropping and the price looks weak",
    "Careful with ${symbol}, liquidity is thin and devs went quiet",
    "Still holding ${symbol} through this market, hodl and see",
    "Anyone else watching ${symbol}? Breakout incoming if volume holds",
];

/// Generates plausible posts for local runs without a social API
pub struct SyntheticPostSource {
    clock: Arc<dyn Clock>,
    posts_per_fetch: usize,
}

impl SyntheticPostSource {
    pub fn new(clock: Arc<dyn Clock>, posts_per_fetch: usize) -> Self {
        Self {
            clock,
            posts_per_fetch,
        }
    }

    fn generate(&self, symbol: &str) -> Vec<NewPost> {
        let mut rng = rand::thread_rng();
        let now = self.clock.now();

        let templates: Vec<&str> = POST_TEMPLATES
            .choose_multiple(&mut rng, self.posts_per_fetch)
            .copied()
            .collect();

        templates
            .into_iter()
            .map(|template| {
                let id = Uuid::new_v4();
                NewPost {
                    post_id: format!("synthetic_{}", id),
                    token_symbol: symbol.to_string(),
                    text: Some(template.replace("{symbol}", symbol)),
                    author: Some(format!("crypto_trader_{}", rng.gen_range(0..1000))),
                    followers_count: rng.gen_range(100..50_000),
                    url: None,
                    created_at: now,
                }
            })
            .collect()
    }
}

#[async_trait]
impl PostSource for SyntheticPostSource {
    async fn fetch_posts(&self, symbol: &str) -> Result<Vec<NewPost>> {
        Ok(self.generate(symbol))
    }
}

// ============================================
// Static feeds (tests)
// ============================================

/// Feed that always returns the same candidates
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    candidates: Vec<TokenCandidate>,
}

impl StaticFeed {
    pub fn new(candidates: Vec<TokenCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateFeed for StaticFeed {
    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>> {
        Ok(self.candidates.clone())
    }
}

/// Post source backed by a fixed list, filtered per symbol
#[derive(Debug, Clone, Default)]
pub struct StaticPostSource {
    posts: Vec<NewPost>,
}

impl StaticPostSource {
    pub fn new(posts: Vec<NewPost>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl PostSource for StaticPostSource {
    async fn fetch_posts(&self, symbol: &str) -> Result<Vec<NewPost>> {
        Ok(self
            .posts
            .iter()
            .filter(|post| post.token_symbol == symbol)
            .cloned()
            .collect())
    }
}
