// Closure-table strategy: every (ancestor, descendant, depth) pair is a row
// in comment_closure. Descendant lookup is one indexed range query; each
// insert costs one edge per ancestor of the parent.

use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error::{AppError, AppResult};
use crate::models::CommentId;

use super::{Ancestor, AncestryIndex};

pub struct ClosureTableIndex;

#[async_trait]
impl AncestryIndex for ClosureTableIndex {
    async fn record_comment(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        comment_id: CommentId,
        parent_id: Option<CommentId>,
    ) -> AppResult<()> {
        // Reflexive self-edge first, so the comment is its own depth-0 ancestor.
        sqlx::query(
            "INSERT INTO comment_closure (ancestor_id, descendant_id, depth) VALUES (?, ?, 0)",
        )
        .bind(comment_id)
        .bind(comment_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::Consistency(format!(
                "Failed to insert self edge for comment {}: {}",
                comment_id, e
            ))
        })?;

        if let Some(parent_id) = parent_id {
            // One edge per ancestor of the parent (the parent's self-edge
            // included), each one step deeper. The parent's edge set is
            // immutable once committed, so concurrent sibling inserts read
            // the same ancestors and never touch each other's rows.
            let inserted = sqlx::query(
                "INSERT INTO comment_closure (ancestor_id, descendant_id, depth)
                 SELECT ancestor_id, ?, depth + 1
                 FROM comment_closure WHERE descendant_id = ?",
            )
            .bind(comment_id)
            .bind(parent_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::Consistency(format!(
                    "Failed to insert ancestor edges for comment {}: {}",
                    comment_id, e
                ))
            })?;

            if inserted.rows_affected() == 0 {
                // The parent is missing its own edge set; refuse to extend a
                // broken invariant and let the transaction roll back.
                return Err(AppError::Consistency(format!(
                    "Comment {} has no ancestor edges",
                    parent_id
                )));
            }
        }

        Ok(())
    }

    async fn descendants_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<CommentId>> {
        sqlx::query_scalar(
            "SELECT descendant_id FROM comment_closure
             WHERE ancestor_id = ? AND depth > 0
             ORDER BY depth, descendant_id",
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
            "SELECT ancestor_id, depth FROM comment_closure
             WHERE descendant_id = ?
             ORDER BY depth",
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
                id: row.get("ancestor_id"),
                depth: row.get("depth"),
            })
            .collect())
    }
}
