use crate::error::{AppError, Result};
use crate::jobs::{PostCollectorConfig, RetentionConfig, SentimentBatchConfig, WomRecomputeConfig};
use crate::services::wom_score::DecayParams;
use serde::Deserialize;
use std::time::Duration;

const MAX_BATCH_CAP: i64 = 1000;
/// Longest accepted retention or staleness horizon (10 years)
const MAX_HORIZON_HOURS: i64 = 87_600;

/// Which store implementation backs the jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server (health, readiness, metrics)
    pub http_host: String,
    pub http_port: u16,

    // Persistence
    pub store: StoreBackend,
    pub database_url: Option<String>,

    // Scoring / aggregation
    pub sentiment_batch_cap: i64,
    pub job_concurrency: usize,
    pub decay_half_life_hours: f64,
    pub aggregation_window_hours: f64,
    pub recompute_token_cap: i64,

    // Retention
    pub post_retention_hours: i64,
    pub token_stale_hours: i64,

    // Feeds
    pub discovery_enabled: bool,
    pub dexscreener_url: String,
    pub collector_enabled: bool,
    pub collector_token_cap: i64,
    pub relevance_filter_enabled: bool,

    // Cadences
    pub sentiment_interval_secs: u64,
    pub recompute_interval_secs: u64,
    pub retention_interval_secs: u64,
    pub discovery_interval_secs: u64,
    pub collector_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8090)?
            .set_default("store", "postgres")?
            .set_default("sentiment_batch_cap", 50)?
            .set_default("job_concurrency", 8)?
            .set_default("decay_half_life_hours", 24.0)?
            .set_default("aggregation_window_hours", 48.0)?
            .set_default("recompute_token_cap", 1000)?
            .set_default("post_retention_hours", 168)? // 7 days
            .set_default("token_stale_hours", 24)?
            .set_default("discovery_enabled", true)?
            .set_default(
                "dexscreener_url",
                "https://api.dexscreener.com/latest/dex/tokens/trending",
            )?
            .set_default("collector_enabled", true)?
            .set_default("collector_token_cap", 10)?
            .set_default("relevance_filter_enabled", true)?
            .set_default("sentiment_interval_secs", 300)? // 5 minutes
            .set_default("recompute_interval_secs", 600)? // 10 minutes
            .set_default("retention_interval_secs", 3600)? // 1 hour
            .set_default("discovery_interval_secs", 1800)? // 30 minutes
            .set_default("collector_interval_secs", 120)? // 2 minutes
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(invalid("HTTP port must be greater than 0"));
        }

        if self.store == StoreBackend::Postgres
            && self.database_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(invalid("DATABASE_URL is required when STORE=postgres"));
        }

        for (name, cap) in [
            ("sentiment_batch_cap", self.sentiment_batch_cap),
            ("recompute_token_cap", self.recompute_token_cap),
            ("collector_token_cap", self.collector_token_cap),
        ] {
            if !(1..=MAX_BATCH_CAP).contains(&cap) {
                return Err(invalid(&format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_BATCH_CAP, cap
                )));
            }
        }

        if self.job_concurrency == 0 {
            return Err(invalid("job_concurrency must be greater than 0"));
        }

        for (name, secs) in [
            ("sentiment_interval_secs", self.sentiment_interval_secs),
            ("recompute_interval_secs", self.recompute_interval_secs),
            ("retention_interval_secs", self.retention_interval_secs),
            ("discovery_interval_secs", self.discovery_interval_secs),
            ("collector_interval_secs", self.collector_interval_secs),
        ] {
            if secs == 0 {
                return Err(invalid(&format!("{} must be greater than 0", name)));
            }
        }

        self.decay_params()
            .validate()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        for (name, hours) in [
            ("token_stale_hours", self.token_stale_hours),
            ("post_retention_hours", self.post_retention_hours),
        ] {
            if !(1..=MAX_HORIZON_HOURS).contains(&hours) {
                return Err(invalid(&format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_HORIZON_HOURS, hours
                )));
            }
        }

        // posts inside the aggregation window must survive the sweep
        if (self.post_retention_hours as f64) < self.aggregation_window_hours {
            return Err(invalid(&format!(
                "post_retention_hours ({}) must cover aggregation_window_hours ({})",
                self.post_retention_hours, self.aggregation_window_hours
            )));
        }

        Ok(())
    }

    pub fn decay_params(&self) -> DecayParams {
        DecayParams::new(self.decay_half_life_hours, self.aggregation_window_hours)
    }

    pub fn sentiment_job(&self) -> SentimentBatchConfig {
        SentimentBatchConfig {
            batch_cap: self.sentiment_batch_cap,
            concurrency: self.job_concurrency,
            interval: Duration::from_secs(self.sentiment_interval_secs),
        }
    }

    pub fn recompute_job(&self) -> WomRecomputeConfig {
        WomRecomputeConfig {
            decay: self.decay_params(),
            token_cap: self.recompute_token_cap,
            concurrency: self.job_concurrency,
            interval: Duration::from_secs(self.recompute_interval_secs),
        }
    }

    pub fn retention_job(&self) -> RetentionConfig {
        RetentionConfig {
            token_stale_after: chrono::Duration::hours(self.token_stale_hours),
            post_retention: chrono::Duration::hours(self.post_retention_hours),
            interval: Duration::from_secs(self.retention_interval_secs),
        }
    }

    pub fn collector_job(&self) -> PostCollectorConfig {
        PostCollectorConfig {
            token_cap: self.collector_token_cap,
            relevance_filter: self.relevance_filter_enabled,
            interval: Duration::from_secs(self.collector_interval_secs),
        }
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Configuration(message.to_string())
}
