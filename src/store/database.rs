// Low-level database access: schema, existence checks, transactions.
// Higher layers (stores, ancestry index) issue their own SQL against the pool.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::{CommentId, PostId, UserId};

/// Async social-graph database over a SQLite connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {}", e)))?;

        Ok(Database { pool })
    }

    /// In-memory database for tests. A single pooled connection keeps every
    /// query on the same in-memory instance.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::DatabaseError(format!("Failed to configure in-memory SQLite: {}", e))
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Database { pool };
        db.init().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin_transaction(&self) -> AppResult<Transaction<'_, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))
    }

    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                profile_image TEXT,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                parent_id INTEGER,
                content TEXT NOT NULL,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comments table: {}", e)))?;

        // Ancestry closure table. Column names spell out which side is which;
        // the reflexive (id, id, 0) edge makes the primary key cover self-edges.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comment_closure (
                ancestor_id INTEGER NOT NULL,
                descendant_id INTEGER NOT NULL,
                depth INTEGER NOT NULL,
                PRIMARY KEY (ancestor_id, descendant_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create comment closure table: {}", e))
        })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS post_likes (
                post_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created INTEGER NOT NULL,
                PRIMARY KEY (post_id, user_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post likes table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS followers (
                follower_id INTEGER NOT NULL,
                following_id INTEGER NOT NULL,
                created INTEGER NOT NULL,
                PRIMARY KEY (follower_id, following_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create followers table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                created INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create notifications table: {}", e))
        })?;

        // Performance indexes
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_post_parent
             ON comments(post_id, parent_id, created DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comments index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create comment parent index: {}", e))
            })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_closure_descendant
             ON comment_closure(descendant_id, depth)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create closure descendant index: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts index: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_followers_following ON followers(following_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create followers index: {}", e)))?;

        Ok(())
    }

    // Existence checks backing the stores' reference validation.

    pub async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check if user {} exists: {}", id, e))
            })?;
        Ok(row.is_some())
    }

    pub async fn post_exists(&self, id: PostId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check if post {} exists: {}", id, e))
            })?;
        Ok(row.is_some())
    }

    /// True when `id` references a comment that belongs to `post_id`.
    pub async fn comment_exists(&self, id: CommentId, post_id: PostId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM comments WHERE id = ? AND post_id = ?")
            .bind(id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to check if comment {} exists: {}", id, e))
            })?;
        Ok(row.is_some())
    }
}
