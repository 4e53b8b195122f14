use super::TokenStore;
use crate::error::{AppError, Result};
use crate::models::{Token, TokenCandidate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

/// PostgreSQL-backed token store (`tokens` table)
#[derive(Clone)]
pub struct SqlxTokenRepository {
    pool: PgPool,
}

impl SqlxTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for SqlxTokenRepository {
    async fn upsert_token(&self, candidate: &TokenCandidate, seen_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (
                token_symbol, token_name, address, volume_usd, liquidity_usd,
                market_cap_usd, dex_url, price_change_1h, launchpad,
                is_active, last_seen_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10)
            ON CONFLICT (token_symbol) DO UPDATE SET
                token_name      = EXCLUDED.token_name,
                address         = EXCLUDED.address,
                volume_usd      = EXCLUDED.volume_usd,
                liquidity_usd   = EXCLUDED.liquidity_usd,
                market_cap_usd  = EXCLUDED.market_cap_usd,
                dex_url         = EXCLUDED.dex_url,
                price_change_1h = EXCLUDED.price_change_1h,
                launchpad       = EXCLUDED.launchpad,
                is_active       = TRUE,
                last_seen_at    = EXCLUDED.last_seen_at
            "#,
        )
        .bind(&candidate.symbol)
        .bind(&candidate.name)
        .bind(&candidate.address)
        .bind(candidate.volume_usd)
        .bind(candidate.liquidity_usd)
        .bind(candidate.market_cap_usd)
        .bind(&candidate.dex_url)
        .bind(candidate.price_change_1h)
        .bind(&candidate.launchpad)
        .bind(seen_at)
        .execute(&self.pool)
        .await?;

        debug!(symbol = %candidate.symbol, "Token upserted");
        Ok(())
    }

    async fn active_symbols_after(&self, after: &str, limit: i64) -> Result<Vec<String>> {
        let symbols = sqlx::query_scalar::<_, String>(
            r#"
            SELECT token_symbol
            FROM tokens
            WHERE is_active = TRUE
              AND token_symbol > $1
            ORDER BY token_symbol ASC
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(symbols)
    }

    async fn collection_targets(&self, limit: i64) -> Result<Vec<String>> {
        let symbols = sqlx::query_scalar::<_, String>(
            r#"
            SELECT token_symbol
            FROM tokens
            WHERE is_active = TRUE
            ORDER BY last_collected_at ASC NULLS FIRST, token_symbol ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(symbols)
    }

    async fn mark_collected(&self, symbol: &str, collected_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE tokens SET last_collected_at = $2 WHERE token_symbol = $1")
            .bind(symbol)
            .bind(collected_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_wom_score(&self, symbol: &str, score: Option<f64>) -> Result<()> {
        let result = sqlx::query("UPDATE tokens SET wom_score = $2 WHERE token_symbol = $1")
            .bind(symbol)
            .bind(score)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("token {}", symbol)));
        }

        Ok(())
    }

    async fn update_token_stats(
        &self,
        symbol: &str,
        tweet_count: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tokens
            SET tweet_count = $2,
                last_seen_at = GREATEST(last_seen_at, $3)
            WHERE token_symbol = $1
            "#,
        )
        .bind(symbol)
        .bind(tweet_count)
        .bind(seen_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tokens t
            SET is_active = FALSE
            WHERE t.is_active = TRUE
              AND t.created_at < $1
              AND t.last_seen_at < $1
              AND NOT EXISTS (
                  SELECT 1
                  FROM token_posts p
                  WHERE p.token_symbol = t.token_symbol
                    AND p.created_at >= $1
              )
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_token(&self, symbol: &str) -> Result<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            r#"
            SELECT token_symbol, token_name, address, volume_usd, liquidity_usd,
                   market_cap_usd, dex_url, price_change_1h, launchpad, wom_score,
                   tweet_count, is_active, last_seen_at, last_collected_at, created_at
            FROM tokens
            WHERE token_symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
