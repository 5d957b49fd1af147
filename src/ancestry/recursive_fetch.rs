// Recursive-fetch strategy: no ancestry writes at all. Reply trees are
// discovered at read time by fetching direct children, then children of
// children, one query per node in depth-first order. Adequate for shallow
// discussion trees; cost grows linearly with thread depth.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use crate::models::CommentId;

use super::{Ancestor, AncestryIndex};

pub struct RecursiveFetchIndex;

#[async_trait]
impl AncestryIndex for RecursiveFetchIndex {
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
        // Explicit worklist instead of call recursion; the visited set keeps
        // the walk finite even if parent links were ever corrupted into a cycle.
        let mut frontier = vec![comment_id];
        let mut seen: HashSet<CommentId> = HashSet::from([comment_id]);
        let mut descendants = Vec::new();

        while let Some(id) = frontier.pop() {
            let children: Vec<CommentId> = sqlx::query_scalar(
                "SELECT id FROM comments WHERE parent_id = ? ORDER BY created DESC, id DESC",
            )
            .bind(id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to load replies of comment {}: {}",
                    id, e
                ))
            })?;

            for child in children {
                if seen.insert(child) {
                    descendants.push(child);
                    frontier.push(child);
                }
            }
        }

        Ok(descendants)
    }

    async fn ancestors_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<Ancestor>> {
        let mut ancestors = vec![Ancestor {
            id: comment_id,
            depth: 0,
        }];
        let mut seen: HashSet<CommentId> = HashSet::from([comment_id]);
        let mut current = comment_id;
        let mut depth = 0;

        loop {
            let parent: Option<Option<CommentId>> =
                sqlx::query_scalar("SELECT parent_id FROM comments WHERE id = ?")
                    .bind(current)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(format!(
                            "Failed to load parent of comment {}: {}",
                            current, e
                        ))
                    })?;

            let Some(parent_id) = parent.flatten() else {
                break;
            };
            if !seen.insert(parent_id) {
                break;
            }
            depth += 1;
            ancestors.push(Ancestor {
                id: parent_id,
                depth,
            });
            current = parent_id;
        }

        Ok(ancestors)
    }
}
