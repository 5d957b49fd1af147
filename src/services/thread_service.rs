// Thread retrieval: root comments from the store, descendants from the
// ancestry index, rows joined with authors, nested by the assembler.

use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ancestry::AncestryIndex;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, CommentAuthor, CommentId, CommentNode, CommentRow, PostId};
use crate::store::{CommentStore, Database};

#[derive(Clone)]
pub struct ThreadService {
    db: Arc<Database>,
    comments: CommentStore,
    ancestry: Arc<dyn AncestryIndex>,
}

impl ThreadService {
    pub fn new(db: Arc<Database>, comments: CommentStore, ancestry: Arc<dyn AncestryIndex>) -> Self {
        Self {
            db,
            comments,
            ancestry,
        }
    }

    /// The full ordered forest of comment trees on a post, or a single
    /// subtree when `root_comment_id` is given.
    pub async fn get_thread(
        &self,
        post_id: PostId,
        root_comment_id: Option<CommentId>,
    ) -> AppResult<Vec<CommentNode>> {
        match root_comment_id {
            Some(root_id) => {
                let root = self.comments.fetch_on_post(root_id, post_id).await?;
                Ok(vec![self.build_subtree(root.id).await?])
            }
            None => {
                let roots = self.comments.list_all_root_comments(post_id).await?;
                self.build_subtrees(&roots).await
            }
        }
    }

    /// One page of root comments, each with its fully nested reply tree.
    pub async fn get_thread_page(
        &self,
        post_id: PostId,
        page: u32,
        page_size: u32,
    ) -> AppResult<(Vec<CommentNode>, bool)> {
        let (roots, has_more) = self
            .comments
            .list_root_comments(post_id, page, page_size)
            .await?;
        let nodes = self.build_subtrees(&roots).await?;
        Ok((nodes, has_more))
    }

    async fn build_subtrees(&self, roots: &[Comment]) -> AppResult<Vec<CommentNode>> {
        try_join_all(roots.iter().map(|root| self.build_subtree(root.id))).await
    }

    async fn build_subtree(&self, root_id: CommentId) -> AppResult<CommentNode> {
        let mut ids = self.ancestry.descendants_of(self.db.pool(), root_id).await?;
        ids.push(root_id);

        let rows = self.comments.fetch_with_authors(&ids).await?;
        let mut forest = assemble_forest(rows);
        if forest.len() != 1 {
            return Err(AppError::Consistency(format!(
                "Expected one tree rooted at comment {}, assembled {}",
                root_id,
                forest.len()
            )));
        }
        Ok(forest.remove(0))
    }
}

/// Nest a flat, pre-ordered list of comment rows into a forest. Each node's
/// `replies` holds exactly its direct children in input order; a row whose
/// parent is absent from the input is a root (that is how a subtree cut out
/// of a larger thread keeps its top node). Every input row appears in the
/// output exactly once.
pub fn assemble_forest(rows: Vec<CommentRow>) -> Vec<CommentNode> {
    let present: HashSet<CommentId> = rows.iter().map(|row| row.id).collect();

    let mut nodes: HashMap<CommentId, CommentNode> = HashMap::with_capacity(rows.len());
    let mut child_ids: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
    let mut root_ids: Vec<CommentId> = Vec::new();

    for row in &rows {
        match row.parent_id.filter(|parent| present.contains(parent)) {
            Some(parent) => child_ids.entry(parent).or_default().push(row.id),
            None => root_ids.push(row.id),
        }
    }
    for row in rows {
        let node = CommentNode {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            content: row.content,
            created: row.created,
            author: CommentAuthor {
                id: row.author_id,
                username: row.author_username,
                profile_image: row.author_profile_image,
            },
            replies: Vec::new(),
        };
        nodes.insert(node.id, node);
    }

    // Parents-before-children order via breadth-first walk from the roots;
    // each id has one parent, so no id is enqueued twice.
    let mut walk: Vec<CommentId> = root_ids.clone();
    let mut index = 0;
    while index < walk.len() {
        if let Some(children) = child_ids.get(&walk[index]) {
            walk.extend(children.iter().copied());
        }
        index += 1;
    }

    // Attach bottom-up: children are moved out of the map before their
    // parent is, so every subtree is complete when it is attached.
    for id in walk.iter().rev() {
        if let Some(children) = child_ids.get(id) {
            let mut replies = Vec::with_capacity(children.len());
            for child in children {
                if let Some(node) = nodes.remove(child) {
                    replies.push(node);
                }
            }
            if let Some(parent) = nodes.get_mut(id) {
                parent.replies = replies;
            }
        }
    }

    root_ids
        .into_iter()
        .filter_map(|id| nodes.remove(&id))
        .collect()
}
