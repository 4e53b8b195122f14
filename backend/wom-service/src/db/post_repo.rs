use super::PostStore;
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, ScoredSample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;

const POST_COLUMNS: &str = "post_id, token_symbol, text, author, followers_count, url, \
                            sentiment_score, created_at";

/// PostgreSQL-backed post store (`token_posts` table)
#[derive(Clone)]
pub struct SqlxPostRepository {
    pool: PgPool,
}

impl SqlxPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for SqlxPostRepository {
    async fn insert_posts(&self, posts: &[NewPost]) -> Result<u64> {
        if posts.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for post in posts {
            inserted += sqlx::query(
                r#"
                INSERT INTO token_posts
                    (post_id, token_symbol, text, author, followers_count, url, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (post_id) DO NOTHING
                "#,
            )
            .bind(&post.post_id)
            .bind(&post.token_symbol)
            .bind(&post.text)
            .bind(&post.author)
            .bind(post.followers_count)
            .bind(&post.url)
            .bind(post.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        debug!(received = posts.len(), inserted, "Inserted posts");
        Ok(inserted)
    }

    async fn find_unscored(&self, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM token_posts
            WHERE sentiment_score IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn set_sentiment_score(&self, post_id: &str, score: i16) -> Result<()> {
        let result = sqlx::query("UPDATE token_posts SET sentiment_score = $2 WHERE post_id = $1")
            .bind(post_id)
            .bind(score)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        Ok(())
    }

    async fn find_scored_since(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScoredSample>> {
        let rows = sqlx::query(
            r#"
            SELECT sentiment_score, created_at
            FROM token_posts
            WHERE token_symbol = $1
              AND created_at >= $2
              AND sentiment_score IS NOT NULL
            "#,
        )
        .bind(symbol)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let score: i16 = row.try_get("sentiment_score")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                Ok(ScoredSample::new(f64::from(score), created_at))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(AppError::from)
    }

    async fn delete_posts_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM token_posts WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_posts(&self, symbol: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM token_posts WHERE token_symbol = $1")
                .bind(symbol)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn recent_posts(&self, symbol: &str, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM token_posts
            WHERE token_symbol = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
