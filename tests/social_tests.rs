// Integration tests for the social surface: users, follows, posts, likes,
// and the composed feed.

use std::sync::Arc;

use social_threads::ancestry::AncestryStrategy;
use social_threads::app_state::AppState;
use social_threads::config::{Config, DatabaseConfig, ServerConfig, ThreadConfig};
use social_threads::error::AppError;
use social_threads::store::Database;

fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        thread: ThreadConfig {
            ancestry_strategy: AncestryStrategy::ClosureTable,
        },
    }
}

async fn state() -> AppState {
    let db = Arc::new(Database::new_in_memory().await.unwrap());
    AppState::with_database(db, test_config())
}

#[tokio::test]
async fn registers_users_and_rejects_duplicates() {
    let state = state().await;

    let alice = state
        .users
        .create_user("alice", "Alice Johnson", Some("https://img.example/alice.png"))
        .await
        .unwrap();
    assert_eq!(alice.username, "alice");

    let duplicate = state.users.create_user("alice", "Another Alice", None).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));

    let empty = state.users.create_user("  ", "No Name", None).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn follow_unfollow_updates_counts_and_notifies() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let bob = state.users.create_user("bob", "Bob", None).await.unwrap();

    let following = state.users.follow(alice.id, bob.id).await.unwrap();
    assert_eq!(following, 1);

    let notifications = state.users.list_notifications(bob.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "alice followed you");

    let profile = state.users.get_profile("bob", Some(alice.id)).await.unwrap();
    assert_eq!(profile.followers, 1);
    assert_eq!(profile.following, 0);
    assert!(profile.is_following);

    let double = state.users.follow(alice.id, bob.id).await;
    assert!(matches!(double, Err(AppError::Validation(_))));

    let own = state.users.follow(alice.id, alice.id).await;
    assert!(matches!(own, Err(AppError::Validation(_))));

    let following = state.users.unfollow(alice.id, bob.id).await.unwrap();
    assert_eq!(following, 0);

    let not_following = state.users.unfollow(alice.id, bob.id).await;
    assert!(matches!(not_following, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn profile_counts_posts_and_is_missing_for_unknown_users() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    state
        .posts
        .create_post(alice.id, "One", "Body")
        .await
        .unwrap();
    state
        .posts
        .create_post(alice.id, "Two", "Body")
        .await
        .unwrap();

    let profile = state.users.get_profile("alice", None).await.unwrap();
    assert_eq!(profile.total_posts, 2);
    assert!(!profile.is_following);

    let missing = state.users.get_profile("nobody", None).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn post_update_and_delete_require_ownership() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let bob = state.users.create_user("bob", "Bob", None).await.unwrap();

    let post = state
        .posts
        .create_post(alice.id, "Title", "<b>Body</b>")
        .await
        .unwrap();
    assert_eq!(post.content, "Body");

    let updated = state
        .posts
        .update_post(post.id, alice.id, "New title", "New body")
        .await
        .unwrap();
    assert_eq!(updated.title, "New title");

    let foreign_update = state
        .posts
        .update_post(post.id, bob.id, "Hijacked", "Nope")
        .await;
    assert!(matches!(foreign_update, Err(AppError::NotFound(_))));

    let foreign_delete = state.posts.delete_post(post.id, bob.id).await;
    assert!(matches!(foreign_delete, Err(AppError::NotFound(_))));

    state.posts.delete_post(post.id, alice.id).await.unwrap();
    let gone = state.posts.fetch_post(post.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn deleting_a_post_cascades_to_comments_edges_and_likes() {
    let db = Arc::new(Database::new_in_memory().await.unwrap());
    let state = AppState::with_database(db.clone(), test_config());

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let post = state
        .posts
        .create_post(alice.id, "Title", "Body")
        .await
        .unwrap();

    let root = state
        .comments
        .create_root_comment(post.id, alice.id, "root")
        .await
        .unwrap();
    state
        .comments
        .create_reply(post.id, root.id, alice.id, "reply")
        .await
        .unwrap();
    state.posts.like_post(post.id, alice.id).await.unwrap();

    state.posts.delete_post(post.id, alice.id).await.unwrap();

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let edges: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_closure")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!((comments, edges, likes), (0, 0, 0));
}

#[tokio::test]
async fn likes_are_unique_per_user() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let bob = state.users.create_user("bob", "Bob", None).await.unwrap();
    let post = state
        .posts
        .create_post(alice.id, "Title", "Body")
        .await
        .unwrap();

    state.posts.like_post(post.id, alice.id).await.unwrap();
    state.posts.like_post(post.id, bob.id).await.unwrap();
    assert_eq!(state.posts.like_count(post.id).await.unwrap(), 2);

    let again = state.posts.like_post(post.id, alice.id).await;
    assert!(matches!(again, Err(AppError::Validation(_))));

    state.posts.unlike_post(post.id, alice.id).await.unwrap();
    assert_eq!(state.posts.like_count(post.id).await.unwrap(), 1);

    let not_liked = state.posts.unlike_post(post.id, alice.id).await;
    assert!(matches!(not_liked, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn user_posts_carry_like_counts_and_viewer_state() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let bob = state.users.create_user("bob", "Bob", None).await.unwrap();

    let post = state
        .posts
        .create_post(alice.id, "Title", "Body")
        .await
        .unwrap();
    state.posts.like_post(post.id, bob.id).await.unwrap();

    let seen_by_bob = state.posts.list_user_posts(alice.id, bob.id).await.unwrap();
    assert_eq!(seen_by_bob.len(), 1);
    assert_eq!(seen_by_bob[0].like_count, 1);
    assert!(seen_by_bob[0].is_liked);

    let seen_by_alice = state
        .posts
        .list_user_posts(alice.id, alice.id)
        .await
        .unwrap();
    assert!(!seen_by_alice[0].is_liked);
}

#[tokio::test]
async fn feed_embeds_nested_comment_previews() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    let bob = state.users.create_user("bob", "Bob", None).await.unwrap();

    let post = state
        .posts
        .create_post(alice.id, "Title", "Body")
        .await
        .unwrap();
    let root = state
        .comments
        .create_root_comment(post.id, bob.id, "first!")
        .await
        .unwrap();
    state
        .comments
        .create_reply(post.id, root.id, alice.id, "thanks")
        .await
        .unwrap();
    state.posts.like_post(post.id, bob.id).await.unwrap();

    let (feed, has_more) = state.feed.list_feed(1, 5).await.unwrap();
    assert!(!has_more);
    assert_eq!(feed.len(), 1);

    let item = &feed[0];
    assert_eq!(item.author.username, "alice");
    assert_eq!(item.like_count, 1);
    assert_eq!(item.comment_count, 2);
    assert!(!item.has_more_comments);
    assert_eq!(item.comments.len(), 1);
    assert_eq!(item.comments[0].content, "first!");
    assert_eq!(item.comments[0].replies[0].content, "thanks");
    assert_eq!(item.comments[0].replies[0].author.username, "alice");
}

#[tokio::test]
async fn feed_pagination_follows_the_post_count() {
    let state = state().await;

    let alice = state.users.create_user("alice", "Alice", None).await.unwrap();
    for n in 0..7 {
        state
            .posts
            .create_post(alice.id, &format!("Post {}", n), "Body")
            .await
            .unwrap();
    }

    let (first_page, has_more) = state.feed.list_feed(1, 5).await.unwrap();
    assert_eq!(first_page.len(), 5);
    assert!(has_more);

    let (second_page, has_more) = state.feed.list_feed(2, 5).await.unwrap();
    assert_eq!(second_page.len(), 2);
    assert!(!has_more);
}

#[tokio::test]
async fn file_backed_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("social.db").display());

    {
        let db = Arc::new(Database::connect(&url).await.unwrap());
        db.init().await.unwrap();
        let state = AppState::with_database(db, test_config());
        state.users.create_user("alice", "Alice", None).await.unwrap();
    }

    let db = Arc::new(Database::connect(&url).await.unwrap());
    db.init().await.unwrap();
    let state = AppState::with_database(db, test_config());
    let profile = state.users.get_profile("alice", None).await.unwrap();
    assert_eq!(profile.username, "alice");
}
