// Post store: post CRUD, likes, and the paginated feed rows the feed
// service decorates with comment threads.

use chrono::Utc;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Post, PostId, PostRow, UserId, UserPostItem};
use crate::sanitize::sanitize_required;
use crate::store::database::Database;

#[derive(Clone)]
pub struct PostStore {
    db: Arc<Database>,
}

impl PostStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_post(
        &self,
        author_id: UserId,
        title: &str,
        content: &str,
    ) -> AppResult<Post> {
        if !self.db.user_exists(author_id).await? {
            return Err(AppError::NotFound("No user with this id exists".to_string()));
        }
        let title = sanitize_required(title, "Title")?;
        let content = sanitize_required(content, "Content")?;
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO posts (author_id, title, content, created, updated)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(author_id)
        .bind(&title)
        .bind(&content)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert post: {}", e)))?;

        Ok(Post {
            id: result.last_insert_rowid(),
            author_id,
            title,
            content,
            created: now,
            updated: now,
        })
    }

    /// Update a post owned by `author_id`. Posts owned by someone else are
    /// indistinguishable from missing ones.
    pub async fn update_post(
        &self,
        post_id: PostId,
        author_id: UserId,
        title: &str,
        content: &str,
    ) -> AppResult<Post> {
        let title = sanitize_required(title, "Title")?;
        let content = sanitize_required(content, "Content")?;
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated = ?
             WHERE id = ? AND author_id = ?",
        )
        .bind(&title)
        .bind(&content)
        .bind(now)
        .bind(post_id)
        .bind(author_id)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", post_id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }

        self.fetch_post(post_id).await
    }

    /// Delete a post owned by `author_id`, cascading to its comments, their
    /// closure edges, and its likes in one transaction.
    pub async fn delete_post(&self, post_id: PostId, author_id: UserId) -> AppResult<()> {
        let mut tx = self.db.begin_transaction().await?;

        let owned = sqlx::query("SELECT 1 FROM posts WHERE id = ? AND author_id = ?")
            .bind(post_id)
            .bind(author_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load post {}: {}", post_id, e)))?;
        if owned.is_none() {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }

        // Every closure edge's descendant is a comment of the post, so the
        // descendant side alone covers the full edge set.
        sqlx::query(
            "DELETE FROM comment_closure WHERE descendant_id IN
             (SELECT id FROM comments WHERE post_id = ?)",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to delete closure edges of post {}: {}",
                post_id, e
            ))
        })?;

        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to delete comments of post {}: {}",
                    post_id, e
                ))
            })?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete likes of post {}: {}", post_id, e))
            })?;

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", post_id, e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to commit deletion of post {}: {}", post_id, e))
        })?;

        Ok(())
    }

    pub async fn fetch_post(&self, post_id: PostId) -> AppResult<Post> {
        sqlx::query_as::<_, Post>(
            "SELECT id, author_id, title, content, created, updated FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to load post {}: {}", post_id, e)))?
        .ok_or_else(|| AppError::NotFound("No post with this id exists".to_string()))
    }

    /// One page of posts with author metadata, newest first, plus the total
    /// post count for the caller's has-more arithmetic.
    pub async fn list_posts(&self, page: u32, limit: u32) -> AppResult<(Vec<PostRow>, i64)> {
        if page == 0 {
            return Err(AppError::Validation("Page must be at least 1".to_string()));
        }

        let posts = sqlx::query_as::<_, PostRow>(
            "SELECT p.id, p.author_id, p.title, p.content, p.created, p.updated,
                    u.username AS author_username, u.profile_image AS author_profile_image
             FROM posts p
             JOIN users u ON u.id = p.author_id
             ORDER BY p.created DESC, p.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind((page as i64 - 1) * limit as i64)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;

        Ok((posts, total))
    }

    /// Posts authored by `author_id` with like counts, newest first, with the
    /// viewer's own like marked.
    pub async fn list_user_posts(
        &self,
        author_id: UserId,
        viewer_id: UserId,
    ) -> AppResult<Vec<UserPostItem>> {
        let rows = sqlx::query_as::<_, (i64, String, String, i64, i64, i64, i64)>(
            "SELECT p.id, p.title, p.content, p.created, p.updated,
                    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
                    EXISTS(SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = ?)
                        AS is_liked
             FROM posts p
             WHERE p.author_id = ?
             ORDER BY p.created DESC, p.id DESC",
        )
        .bind(viewer_id)
        .bind(author_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list posts of user {}: {}", author_id, e))
        })?;

        Ok(rows
            .into_iter()
            .map(
                |(id, title, content, created, updated, like_count, is_liked)| UserPostItem {
                    id,
                    title,
                    content,
                    created,
                    updated,
                    like_count,
                    is_liked: is_liked != 0,
                },
            )
            .collect())
    }

    pub async fn like_post(&self, post_id: PostId, user_id: UserId) -> AppResult<()> {
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }
        if !self.db.user_exists(user_id).await? {
            return Err(AppError::NotFound("No user with this id exists".to_string()));
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_likes (post_id, user_id, created) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(Utc::now().timestamp_millis())
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to like post {}: {}", post_id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation("Post already liked".to_string()));
        }
        Ok(())
    }

    pub async fn unlike_post(&self, post_id: PostId, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to unlike post {}: {}", post_id, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post is not liked".to_string()));
        }
        Ok(())
    }

    pub async fn like_count(&self, post_id: PostId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to count likes of post {}: {}", post_id, e))
            })
    }
}
