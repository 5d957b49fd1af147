use std::sync::Arc;

use crate::{
    ancestry,
    config::Config,
    error::AppResult,
    services::{FeedService, ThreadService},
    store::{CommentStore, Database, PostStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub posts: PostStore,
    pub comments: CommentStore,
    pub threads: ThreadService,
    pub feed: FeedService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = Arc::new(Database::connect(&config.database.url).await?);
        database.init().await?;
        Ok(Self::with_database(database, config))
    }

    /// Wire stores and services over an already-initialized database. Tests
    /// use this with an in-memory pool.
    pub fn with_database(database: Arc<Database>, config: Config) -> Self {
        let ancestry = ancestry::build_index(config.thread.ancestry_strategy);

        let users = UserStore::new(database.clone());
        let posts = PostStore::new(database.clone());
        let comments = CommentStore::new(database.clone(), ancestry.clone());
        let threads = ThreadService::new(database, comments.clone(), ancestry);
        let feed = FeedService::new(posts.clone(), comments.clone(), threads.clone());

        Self {
            users,
            posts,
            comments,
            threads,
            feed,
            config,
        }
    }
}
