// Ancestry index for the comment tree. Three interchangeable strategies
// answer the same two questions: all transitive descendants of a comment
// (to build its reply tree) and all ancestors (to propagate edges on insert).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::CommentId;

pub mod closure_table;
pub mod recursive_fetch;
pub mod recursive_query;

pub use closure_table::ClosureTableIndex;
pub use recursive_fetch::RecursiveFetchIndex;
pub use recursive_query::RecursiveQueryIndex;

/// An ancestor of a comment. `depth` is the number of parent steps from the
/// comment up to this ancestor; depth 0 is the comment itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    pub id: CommentId,
    pub depth: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AncestryStrategy {
    ClosureTable,
    RecursiveQuery,
    RecursiveFetch,
}

impl AncestryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AncestryStrategy::ClosureTable => "closure-table",
            AncestryStrategy::RecursiveQuery => "recursive-query",
            AncestryStrategy::RecursiveFetch => "recursive-fetch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "closure-table" => Some(AncestryStrategy::ClosureTable),
            "recursive-query" => Some(AncestryStrategy::RecursiveQuery),
            "recursive-fetch" => Some(AncestryStrategy::RecursiveFetch),
            _ => None,
        }
    }
}

/// Contract shared by all strategies. Results carry no duplicates; the
/// strategy choice is not observable through this interface.
#[async_trait]
pub trait AncestryIndex: Send + Sync {
    /// Record ancestry bookkeeping for a freshly inserted comment. Runs
    /// inside the comment-creation transaction; a failure here rolls back the
    /// comment row together with any partial edge rows.
    async fn record_comment(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        comment_id: CommentId,
        parent_id: Option<CommentId>,
    ) -> AppResult<()>;

    /// Ids of every transitive descendant of `comment_id`, the comment itself
    /// excluded.
    async fn descendants_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<CommentId>>;

    /// Every ancestor of `comment_id` including itself at depth 0, nearest
    /// first.
    async fn ancestors_of(
        &self,
        pool: &SqlitePool,
        comment_id: CommentId,
    ) -> AppResult<Vec<Ancestor>>;
}

/// Build the configured strategy.
pub fn build_index(strategy: AncestryStrategy) -> Arc<dyn AncestryIndex> {
    match strategy {
        AncestryStrategy::ClosureTable => Arc::new(ClosureTableIndex),
        AncestryStrategy::RecursiveQuery => Arc::new(RecursiveQueryIndex),
        AncestryStrategy::RecursiveFetch => Arc::new(RecursiveFetchIndex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_parse() {
        for strategy in [
            AncestryStrategy::ClosureTable,
            AncestryStrategy::RecursiveQuery,
            AncestryStrategy::RecursiveFetch,
        ] {
            assert_eq!(AncestryStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(AncestryStrategy::parse("nested-set"), None);
    }
}
