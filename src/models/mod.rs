// Row types and presentation types for the social graph.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub created: i64,
    pub updated: i64,
}

/// A stored comment. `parent_id` is `None` for root comments; when present it
/// references an existing comment on the same post.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created: i64,
}

/// One row of the closure table: `ancestor_id` reaches `descendant_id` in
/// `depth` parent steps. Every comment carries the reflexive `(id, id, 0)` edge.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClosureEdge {
    pub ancestor_id: CommentId,
    pub descendant_id: CommentId,
    pub depth: i64,
}

/// Comment joined with the author columns the presentation layer needs.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created: i64,
    pub author_username: String,
    pub author_profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentAuthor {
    pub id: UserId,
    pub username: String,
    pub profile_image: Option<String>,
}

/// A comment with its reply tree, built fresh per request and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created: i64,
    pub author: CommentAuthor,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Total number of nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::count).sum::<usize>()
    }
}

/// Post joined with author columns, as listed in the feed.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub created: i64,
    pub updated: i64,
    pub author_username: String,
    pub author_profile_image: Option<String>,
}

/// One feed entry: a post, its author, its counts, and the first page of
/// fully nested comment threads.
#[derive(Debug, Clone, Serialize)]
pub struct PostFeedItem {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub created: i64,
    pub updated: i64,
    pub author: CommentAuthor,
    pub like_count: i64,
    pub comment_count: i64,
    pub comments: Vec<CommentNode>,
    pub has_more_comments: bool,
}

/// A post as listed on its author's own page.
#[derive(Debug, Clone, Serialize)]
pub struct UserPostItem {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub created: i64,
    pub updated: i64,
    pub like_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub total_posts: i64,
    pub followers: i64,
    pub following: i64,
    pub is_following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub message: String,
    pub created: i64,
}
