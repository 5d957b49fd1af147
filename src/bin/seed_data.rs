// Populates the configured database with sample users, follows, posts,
// likes, and a few nested comment threads.

use rand::prelude::*;
use std::sync::Arc;

use social_threads::{app_state::AppState, config::Config, store::Database};

const USERNAMES: &[(&str, &str)] = &[
    ("alice", "Alice Johnson"),
    ("bob", "Bob Smith"),
    ("carol", "Carol White"),
    ("dave", "Dave Brown"),
    ("erin", "Erin Davis"),
];

const POST_TITLES: &[&str] = &[
    "Weekend hiking trip",
    "My favorite pasta recipe",
    "Thoughts on remote work",
    "City photography walk",
    "Learning to play guitar",
];

const COMMENT_LINES: &[&str] = &[
    "Love this!",
    "Great write-up, thanks for sharing.",
    "I had a similar experience last year.",
    "Could you share more details?",
    "Totally agree with this.",
    "Not sure I follow, can you explain?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    println!("🌱 Seeding sample data into {}", config.database.url);

    let database = Arc::new(Database::connect(&config.database.url).await?);
    database.init().await?;
    let state = AppState::with_database(database, config);

    let mut user_ids = Vec::new();
    for &(username, name) in USERNAMES {
        let user = state.users.create_user(username, name, None).await?;
        user_ids.push(user.id);
    }
    println!("   {} users created", user_ids.len());

    let mut follows = 0;
    for &follower in &user_ids {
        for &followed in &user_ids {
            if follower != followed && rand::rng().random_bool(0.4) {
                state.users.follow(follower, followed).await?;
                follows += 1;
            }
        }
    }
    println!("   {} follow edges created", follows);

    let mut post_ids = Vec::new();
    for title in POST_TITLES {
        let author = pick(&user_ids);
        let post = state
            .posts
            .create_post(author, title, "Lorem ipsum dolor sit amet.")
            .await?;
        post_ids.push(post.id);
    }
    println!("   {} posts created", post_ids.len());

    let mut likes = 0;
    for &post_id in &post_ids {
        for &user_id in &user_ids {
            if rand::rng().random_bool(0.3) {
                state.posts.like_post(post_id, user_id).await?;
                likes += 1;
            }
        }
    }
    println!("   {} likes created", likes);

    let mut comments = 0;
    for &post_id in &post_ids {
        let roots = rand::rng().random_range(1..4);
        for _ in 0..roots {
            let root = state
                .comments
                .create_root_comment(post_id, pick(&user_ids), pick(COMMENT_LINES))
                .await?;
            comments += 1;

            // Random reply chain below each root, occasionally branching.
            let mut parent = root.id;
            let depth = rand::rng().random_range(0..4);
            for _ in 0..depth {
                let reply = state
                    .comments
                    .create_reply(post_id, parent, pick(&user_ids), pick(COMMENT_LINES))
                    .await?;
                comments += 1;
                if rand::rng().random_bool(0.5) {
                    parent = reply.id;
                }
            }
        }
    }
    println!("   {} comments created", comments);

    println!("✅ Sample data ready");
    Ok(())
}

fn pick<T: Copy>(items: &[T]) -> T {
    *items
        .choose(&mut rand::rng())
        .expect("seed item lists are non-empty")
}
