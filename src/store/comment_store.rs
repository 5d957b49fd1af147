// Comment store: append-only comment rows plus strategy-dependent ancestry
// bookkeeping, created atomically in one transaction.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use std::sync::Arc;

use crate::ancestry::AncestryIndex;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, CommentId, CommentRow, PostId, UserId};
use crate::sanitize::sanitize_required;
use crate::store::database::Database;

#[derive(Clone)]
pub struct CommentStore {
    db: Arc<Database>,
    ancestry: Arc<dyn AncestryIndex>,
}

impl CommentStore {
    pub fn new(db: Arc<Database>, ancestry: Arc<dyn AncestryIndex>) -> Self {
        Self { db, ancestry }
    }

    pub async fn create_root_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> AppResult<Comment> {
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }
        self.insert_comment(post_id, None, author_id, content).await
    }

    pub async fn create_reply(
        &self,
        post_id: PostId,
        parent_id: CommentId,
        author_id: UserId,
        content: &str,
    ) -> AppResult<Comment> {
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }
        // The parent must belong to the same post; this is what keeps parent
        // links a forest.
        if !self.db.comment_exists(parent_id, post_id).await? {
            return Err(AppError::NotFound(
                "No comment with this id exists".to_string(),
            ));
        }
        self.insert_comment(post_id, Some(parent_id), author_id, content)
            .await
    }

    async fn insert_comment(
        &self,
        post_id: PostId,
        parent_id: Option<CommentId>,
        author_id: UserId,
        content: &str,
    ) -> AppResult<Comment> {
        if !self.db.user_exists(author_id).await? {
            return Err(AppError::NotFound("No user with this id exists".to_string()));
        }
        let content = sanitize_required(content, "Content")?;
        let now = Utc::now().timestamp_millis();

        // Comment row and ancestry edges commit together or not at all;
        // dropping the transaction on any failure discards both.
        let mut tx = self.db.begin_transaction().await?;

        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, parent_id, content, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(parent_id)
        .bind(&content)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert comment: {}", e)))?;

        let id = result.last_insert_rowid();

        self.ancestry.record_comment(&mut tx, id, parent_id).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit comment {}: {}", id, e)))?;

        Ok(Comment {
            id,
            post_id,
            author_id,
            parent_id,
            content,
            created: now,
        })
    }

    /// One page of root comments, newest first. `page` is 1-based.
    pub async fn list_root_comments(
        &self,
        post_id: PostId,
        page: u32,
        page_size: u32,
    ) -> AppResult<(Vec<Comment>, bool)> {
        if page == 0 {
            return Err(AppError::Validation("Page must be at least 1".to_string()));
        }
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }

        let total = self.count_root_comments(post_id).await?;

        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, parent_id, content, created
             FROM comments WHERE post_id = ? AND parent_id IS NULL
             ORDER BY created DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(post_id)
        .bind(page_size as i64)
        .bind((page as i64 - 1) * page_size as i64)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list root comments of post {}: {}",
                post_id, e
            ))
        })?;

        let has_more = total > (page as i64) * (page_size as i64);
        Ok((comments, has_more))
    }

    /// Every root comment of a post, newest first.
    pub async fn list_all_root_comments(&self, post_id: PostId) -> AppResult<Vec<Comment>> {
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound("No post with this id exists".to_string()));
        }

        sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, parent_id, content, created
             FROM comments WHERE post_id = ? AND parent_id IS NULL
             ORDER BY created DESC, id DESC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list root comments of post {}: {}",
                post_id, e
            ))
        })
    }

    pub async fn count_root_comments(&self, post_id: PostId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE post_id = ? AND parent_id IS NULL",
        )
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to count root comments of post {}: {}",
                post_id, e
            ))
        })
    }

    pub async fn count_comments(&self, post_id: PostId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to count comments of post {}: {}",
                    post_id, e
                ))
            })
    }

    /// A single comment verified to belong to `post_id`.
    pub async fn fetch_on_post(&self, id: CommentId, post_id: PostId) -> AppResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, parent_id, content, created
             FROM comments WHERE id = ? AND post_id = ?",
        )
        .bind(id)
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to load comment {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound("No comment with this id exists".to_string()))
    }

    /// Comment rows joined with author metadata, newest first. Drives the
    /// tree assembler, which expects its input pre-ordered.
    pub async fn fetch_with_authors(&self, ids: &[CommentId]) -> AppResult<Vec<CommentRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT c.id, c.post_id, c.author_id, c.parent_id, c.content, c.created,
                    u.username AS author_username, u.profile_image AS author_profile_image
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        query.push(" ORDER BY c.created DESC, c.id DESC");

        query
            .build_query_as::<CommentRow>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load comment rows: {}", e)))
    }
}
