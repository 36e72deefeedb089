//! Database operations for Crosscast

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{Platform, PostRecord, PostStatus};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes keep the URL valid on Windows; mode=rwc creates the file
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        Self::from_pool(pool).await
    }

    /// Use an existing pool, running migrations against it
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Insert the record for one successful publish
    pub async fn create_post_record(&self, record: &PostRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, user_id, account_id, platform, platform_post_id, content, media_url,
                status, scheduled_at, created_at, likes, comments, shares, views
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.account_id)
        .bind(record.platform.as_str())
        .bind(&record.platform_post_id)
        .bind(&record.content)
        .bind(&record.media_url)
        .bind(record.status.as_str())
        .bind(record.scheduled_at)
        .bind(record.created_at)
        .bind(record.likes)
        .bind(record.comments)
        .bind(record.shares)
        .bind(record.views)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Most recent records for a user, newest first
    pub async fn list_posts(&self, user_id: &str, limit: usize) -> Result<Vec<PostRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, account_id, platform, platform_post_id, content, media_url,
                   status, scheduled_at, created_at, likes, comments, shares, views
            FROM posts
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_record).collect()
    }

    pub async fn count_posts(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(count)
    }
}

fn row_to_record(row: &SqliteRow) -> Result<PostRecord> {
    let platform: Platform = row.get::<String, _>("platform").parse()?;
    let status: PostStatus = row.get::<String, _>("status").parse()?;

    Ok(PostRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        account_id: row.get("account_id"),
        platform,
        platform_post_id: row.get("platform_post_id"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        status,
        scheduled_at: row.get("scheduled_at"),
        created_at: row.get("created_at"),
        likes: row.get("likes"),
        comments: row.get("comments"),
        shares: row.get("shares"),
        views: row.get("views"),
    })
}
