// Integration tests for comment threads: ancestry strategies, tree
// assembly, and the atomicity of comment-plus-edge creation.

use std::sync::Arc;

use social_threads::ancestry::{self, AncestryIndex, AncestryStrategy};
use social_threads::error::AppError;
use social_threads::models::{CommentId, CommentNode, PostId, UserId};
use social_threads::services::ThreadService;
use social_threads::store::{CommentStore, Database, PostStore, UserStore};

const ALL_STRATEGIES: [AncestryStrategy; 3] = [
    AncestryStrategy::ClosureTable,
    AncestryStrategy::RecursiveQuery,
    AncestryStrategy::RecursiveFetch,
];

struct Fixture {
    db: Arc<Database>,
    comments: CommentStore,
    threads: ThreadService,
    user_id: UserId,
    post_id: PostId,
}

async fn fixture(strategy: AncestryStrategy) -> Fixture {
    let db = Arc::new(Database::new_in_memory().await.unwrap());
    let index = ancestry::build_index(strategy);

    let users = UserStore::new(db.clone());
    let posts = PostStore::new(db.clone());
    let comments = CommentStore::new(db.clone(), index.clone());
    let threads = ThreadService::new(db.clone(), comments.clone(), index);

    let user = users.create_user("alice", "Alice Johnson", None).await.unwrap();
    let post = posts
        .create_post(user.id, "First post", "Hello world")
        .await
        .unwrap();

    Fixture {
        db,
        comments,
        threads,
        user_id: user.id,
        post_id: post.id,
    }
}

fn sorted(mut ids: Vec<CommentId>) -> Vec<CommentId> {
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn fresh_root_has_no_descendants() {
    for strategy in ALL_STRATEGIES {
        let fx = fixture(strategy).await;
        let index = ancestry::build_index(strategy);

        let root = fx
            .comments
            .create_root_comment(fx.post_id, fx.user_id, "Hello")
            .await
            .unwrap();

        let descendants = index.descendants_of(fx.db.pool(), root.id).await.unwrap();
        assert!(
            descendants.is_empty(),
            "strategy {} returned descendants for a fresh root",
            strategy.as_str()
        );

        let ancestors = index.ancestors_of(fx.db.pool(), root.id).await.unwrap();
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].id, root.id);
        assert_eq!(ancestors[0].depth, 0);
    }
}

#[tokio::test]
async fn chain_descendants_and_ancestors() {
    for strategy in ALL_STRATEGIES {
        let fx = fixture(strategy).await;
        let index = ancestry::build_index(strategy);

        let a = fx
            .comments
            .create_root_comment(fx.post_id, fx.user_id, "A")
            .await
            .unwrap();
        let b = fx
            .comments
            .create_reply(fx.post_id, a.id, fx.user_id, "B")
            .await
            .unwrap();
        let c = fx
            .comments
            .create_reply(fx.post_id, b.id, fx.user_id, "C")
            .await
            .unwrap();

        let descendants = index.descendants_of(fx.db.pool(), a.id).await.unwrap();
        assert_eq!(
            sorted(descendants),
            sorted(vec![b.id, c.id]),
            "strategy {}",
            strategy.as_str()
        );

        let ancestors = index.ancestors_of(fx.db.pool(), c.id).await.unwrap();
        assert_eq!(
            sorted(ancestors.iter().map(|anc| anc.id).collect()),
            sorted(vec![a.id, b.id, c.id]),
            "strategy {}",
            strategy.as_str()
        );

        let depth_of_a = ancestors
            .iter()
            .find(|anc| anc.id == a.id)
            .map(|anc| anc.depth)
            .unwrap();
        assert_eq!(depth_of_a, 2, "strategy {}", strategy.as_str());
    }
}

#[tokio::test]
async fn strategies_agree_on_descendant_sets() {
    // Write with the closure table so both parent links and closure edges
    // exist, then read the same data back through every strategy.
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let root = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "root")
        .await
        .unwrap();
    let left = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "left")
        .await
        .unwrap();
    let right = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "right")
        .await
        .unwrap();
    let left_child = fx
        .comments
        .create_reply(fx.post_id, left.id, fx.user_id, "left child")
        .await
        .unwrap();
    let deep = fx
        .comments
        .create_reply(fx.post_id, left_child.id, fx.user_id, "deep")
        .await
        .unwrap();

    let expected = sorted(vec![left.id, right.id, left_child.id, deep.id]);
    for strategy in ALL_STRATEGIES {
        let index = ancestry::build_index(strategy);
        let descendants = index.descendants_of(fx.db.pool(), root.id).await.unwrap();
        assert_eq!(
            sorted(descendants),
            expected,
            "strategy {} disagrees",
            strategy.as_str()
        );
    }
}

#[tokio::test]
async fn get_thread_returns_the_worked_example_shape() {
    for strategy in ALL_STRATEGIES {
        let fx = fixture(strategy).await;

        let hello = fx
            .comments
            .create_root_comment(fx.post_id, fx.user_id, "Hello")
            .await
            .unwrap();
        let hi_back = fx
            .comments
            .create_reply(fx.post_id, hello.id, fx.user_id, "Hi back")
            .await
            .unwrap();
        let thanks = fx
            .comments
            .create_reply(fx.post_id, hi_back.id, fx.user_id, "Thanks")
            .await
            .unwrap();

        let thread = fx.threads.get_thread(fx.post_id, None).await.unwrap();
        assert_eq!(thread.len(), 1, "strategy {}", strategy.as_str());

        let root = &thread[0];
        assert_eq!(root.id, hello.id);
        assert_eq!(root.content, "Hello");
        assert_eq!(root.author.username, "alice");
        assert_eq!(root.replies.len(), 1);
        assert_eq!(root.replies[0].id, hi_back.id);
        assert_eq!(root.replies[0].content, "Hi back");
        assert_eq!(root.replies[0].replies.len(), 1);
        assert_eq!(root.replies[0].replies[0].id, thanks.id);
        assert_eq!(root.replies[0].replies[0].content, "Thanks");
        assert!(root.replies[0].replies[0].replies.is_empty());
    }
}

#[tokio::test]
async fn assembled_forest_preserves_node_count() {
    for strategy in ALL_STRATEGIES {
        let fx = fixture(strategy).await;

        // Two roots, one with a branching reply tree.
        let first = fx
            .comments
            .create_root_comment(fx.post_id, fx.user_id, "first")
            .await
            .unwrap();
        fx.comments
            .create_root_comment(fx.post_id, fx.user_id, "second")
            .await
            .unwrap();
        let reply = fx
            .comments
            .create_reply(fx.post_id, first.id, fx.user_id, "reply")
            .await
            .unwrap();
        fx.comments
            .create_reply(fx.post_id, first.id, fx.user_id, "sibling")
            .await
            .unwrap();
        fx.comments
            .create_reply(fx.post_id, reply.id, fx.user_id, "nested")
            .await
            .unwrap();

        let thread = fx.threads.get_thread(fx.post_id, None).await.unwrap();
        let total: usize = thread.iter().map(CommentNode::count).sum();
        assert_eq!(total, 5, "strategy {}", strategy.as_str());
    }
}

#[tokio::test]
async fn subtree_query_returns_only_that_branch() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let root = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "root")
        .await
        .unwrap();
    let branch = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "branch")
        .await
        .unwrap();
    fx.comments
        .create_reply(fx.post_id, branch.id, fx.user_id, "leaf")
        .await
        .unwrap();
    fx.comments
        .create_reply(fx.post_id, root.id, fx.user_id, "other branch")
        .await
        .unwrap();

    let thread = fx
        .threads
        .get_thread(fx.post_id, Some(branch.id))
        .await
        .unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].id, branch.id);
    assert_eq!(thread[0].count(), 2);
}

#[tokio::test]
async fn concurrent_replies_do_not_interfere() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;
    let index = ancestry::build_index(AncestryStrategy::ClosureTable);

    let parent = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "parent")
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        fx.comments
            .create_reply(fx.post_id, parent.id, fx.user_id, "first sibling"),
        fx.comments
            .create_reply(fx.post_id, parent.id, fx.user_id, "second sibling"),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    // Each sibling descends from the parent alone; neither sees the other.
    let descendants = index.descendants_of(fx.db.pool(), parent.id).await.unwrap();
    assert_eq!(sorted(descendants), sorted(vec![first.id, second.id]));

    let first_down = index.descendants_of(fx.db.pool(), first.id).await.unwrap();
    let second_down = index.descendants_of(fx.db.pool(), second.id).await.unwrap();
    assert!(first_down.is_empty());
    assert!(second_down.is_empty());

    for id in [first.id, second.id] {
        let ancestors = index.ancestors_of(fx.db.pool(), id).await.unwrap();
        assert_eq!(
            sorted(ancestors.iter().map(|anc| anc.id).collect()),
            sorted(vec![parent.id, id])
        );
    }
}

#[tokio::test]
async fn comment_ordering_is_newest_first_at_every_level() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let root = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "root")
        .await
        .unwrap();
    let older = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "older reply")
        .await
        .unwrap();
    let newer = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "newer reply")
        .await
        .unwrap();
    fx.comments
        .create_root_comment(fx.post_id, fx.user_id, "newer root")
        .await
        .unwrap();

    let thread = fx.threads.get_thread(fx.post_id, None).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].content, "newer root");
    assert_eq!(thread[1].id, root.id);

    let reply_ids: Vec<CommentId> = thread[1].replies.iter().map(|node| node.id).collect();
    assert_eq!(reply_ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn root_comment_pagination_reports_has_more() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    for n in 0..7 {
        fx.comments
            .create_root_comment(fx.post_id, fx.user_id, &format!("comment {}", n))
            .await
            .unwrap();
    }

    let (first_page, has_more) = fx
        .comments
        .list_root_comments(fx.post_id, 1, 5)
        .await
        .unwrap();
    assert_eq!(first_page.len(), 5);
    assert!(has_more);

    let (second_page, has_more) = fx
        .comments
        .list_root_comments(fx.post_id, 2, 5)
        .await
        .unwrap();
    assert_eq!(second_page.len(), 2);
    assert!(!has_more);
}

#[tokio::test]
async fn rejects_missing_references_and_empty_content() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let missing_post = fx
        .comments
        .create_root_comment(fx.post_id + 100, fx.user_id, "hello")
        .await;
    assert!(matches!(missing_post, Err(AppError::NotFound(_))));

    let missing_parent = fx
        .comments
        .create_reply(fx.post_id, 9999, fx.user_id, "hello")
        .await;
    assert!(matches!(missing_parent, Err(AppError::NotFound(_))));

    let empty = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "<p>  </p>")
        .await;
    assert!(matches!(empty, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn reply_must_target_a_comment_on_the_same_post() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let posts = PostStore::new(fx.db.clone());
    let other_post = posts
        .create_post(fx.user_id, "Other post", "Body")
        .await
        .unwrap();
    let other_root = fx
        .comments
        .create_root_comment(other_post.id, fx.user_id, "elsewhere")
        .await
        .unwrap();

    let cross_post = fx
        .comments
        .create_reply(fx.post_id, other_root.id, fx.user_id, "hello")
        .await;
    assert!(matches!(cross_post, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn closure_edges_commit_atomically_with_the_comment() {
    let fx = fixture(AncestryStrategy::ClosureTable).await;

    let root = fx
        .comments
        .create_root_comment(fx.post_id, fx.user_id, "root")
        .await
        .unwrap();
    fx.comments
        .create_reply(fx.post_id, root.id, fx.user_id, "reply")
        .await
        .unwrap();

    // Row counts line up: 2 comments, 2 self-edges plus 1 ancestor edge.
    let comment_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(fx.db.pool())
        .await
        .unwrap();
    let edge_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_closure")
        .fetch_one(fx.db.pool())
        .await
        .unwrap();
    assert_eq!(comment_count, 2);
    assert_eq!(edge_count, 3);

    // Break the root's edge set by hand: the next reply must fail with a
    // consistency error and roll back its comment row along with any edges.
    sqlx::query("DELETE FROM comment_closure WHERE descendant_id = ?")
        .bind(root.id)
        .execute(fx.db.pool())
        .await
        .unwrap();

    let failed = fx
        .comments
        .create_reply(fx.post_id, root.id, fx.user_id, "orphan")
        .await;
    assert!(matches!(failed, Err(AppError::Consistency(_))));

    let comment_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(fx.db.pool())
        .await
        .unwrap();
    let edge_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_closure")
        .fetch_one(fx.db.pool())
        .await
        .unwrap();
    assert_eq!(comment_count, 2);
    assert_eq!(edge_count, 2);
}
