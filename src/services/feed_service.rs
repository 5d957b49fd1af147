// Feed composition: posts joined with their authors, decorated with like and
// comment counts and a preview of fully nested comment threads.

use futures::future::try_join_all;

use crate::error::AppResult;
use crate::models::{CommentAuthor, PostFeedItem, PostRow};
use crate::services::thread_service::ThreadService;
use crate::store::{CommentStore, PostStore};

/// Root comments shown inline per feed entry before the client pages the
/// thread itself.
const FEED_COMMENT_PREVIEW: u32 = 5;

#[derive(Clone)]
pub struct FeedService {
    posts: PostStore,
    comments: CommentStore,
    threads: ThreadService,
}

impl FeedService {
    pub fn new(posts: PostStore, comments: CommentStore, threads: ThreadService) -> Self {
        Self {
            posts,
            comments,
            threads,
        }
    }

    pub async fn list_feed(&self, page: u32, limit: u32) -> AppResult<(Vec<PostFeedItem>, bool)> {
        let (rows, total) = self.posts.list_posts(page, limit).await?;
        let has_more = (page as i64 - 1) * limit as i64 + (rows.len() as i64) < total;

        let items = try_join_all(rows.into_iter().map(|row| self.build_item(row))).await?;
        Ok((items, has_more))
    }

    async fn build_item(&self, row: PostRow) -> AppResult<PostFeedItem> {
        let (comments, has_more_comments) = self
            .threads
            .get_thread_page(row.id, 1, FEED_COMMENT_PREVIEW)
            .await?;
        let like_count = self.posts.like_count(row.id).await?;
        let comment_count = self.comments.count_comments(row.id).await?;

        Ok(PostFeedItem {
            id: row.id,
            title: row.title,
            content: row.content,
            created: row.created,
            updated: row.updated,
            author: CommentAuthor {
                id: row.author_id,
                username: row.author_username,
                profile_image: row.author_profile_image,
            },
            like_count,
            comment_count,
            comments,
            has_more_comments,
        })
    }
}
