// Social Threads Server

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use social_threads::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    // Build main application router
    let app = Router::new()
        .nest("/api/v1", create_router(app_state))
        .layer(CorsLayer::permissive());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    println!("🚀 Social Threads Server starting on http://{}", addr);
    println!("   Ancestry strategy: {}", config.thread.ancestry_strategy.as_str());
    println!("📋 API:");
    println!("  POST   /api/v1/users                                       - Register user");
    println!("  GET    /api/v1/users/{{username}}/profile                    - User profile");
    println!("  POST   /api/v1/users/{{user_id}}/follow                      - Follow user");
    println!("  GET    /api/v1/posts                                       - Post feed");
    println!("  POST   /api/v1/posts/{{post_id}}/comments                    - Comment on post");
    println!("  POST   /api/v1/posts/{{post_id}}/comments/{{id}}/replies      - Reply to comment");
    println!("  GET    /api/v1/posts/{{post_id}}/comments                    - Nested comment threads");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
