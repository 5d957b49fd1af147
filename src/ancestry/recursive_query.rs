// Recursive-query strategy: no auxiliary table. Descendants and ancestors
// are fixpoint queries over parent_id, re-joining children (or parents)
// until no new rows appear.
//
// Assumes parent links form a forest. The stores guarantee this by
// construction (a reply's parent must already exist on the same post); it is
// not re-verified here.

use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error::{AppError, AppResult};
use crate::models::CommentId;

use super::{Ancestor, AncestryIndex};

pub struct RecursiveQueryIndex;

#[async_trait]
impl AncestryIndex for RecursiveQueryIndex {
    async fn record_comment(
        &self,
        _tx: &mut Transaction<'_, Sqlite>,
        _comment_id: CommentId,
        _parent_id: Option<CommentId>,
    ) -> AppResult<()> {
        // parent_id on the comment row is the only ancestry state.
        Ok(())
    }

    async fn descendants_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<CommentId>> {
        // UNION (not UNION ALL) discards already-seen ids, so the fixpoint
        // terminates with no duplicates.
        sqlx::query_scalar(
            "WITH RECURSIVE descendants(id) AS (
                 SELECT id FROM comments WHERE parent_id = ?
                 UNION
                 SELECT c.id FROM comments c
                 JOIN descendants d ON c.parent_id = d.id
             )
             SELECT id FROM descendants ORDER BY id",
        )
        .bind(comment_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to load descendants of comment {}: {}",
                comment_id, e
            ))
        })
    }

    async fn ancestors_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<Ancestor>> {
        let rows = sqlx::query(
            "WITH RECURSIVE ancestors(id, parent_id, depth) AS (
                 SELECT id, parent_id, 0 FROM comments WHERE id = ?
                 UNION ALL
                 SELECT c.id, c.parent_id, a.depth + 1 FROM comments c
                 JOIN ancestors a ON c.id = a.parent_id
             )
             SELECT id, depth FROM ancestors ORDER BY depth",
        )
        .bind(comment_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to load ancestors of comment {}: {}",
                comment_id, e
            ))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Ancestor {
                id: row.get("id"),
                depth: row.get("depth"),
            })
            .collect())
    }
}
