// HTTP request layer. Handlers validate the request shape, call one service
// or store, and wrap the result in the JSON envelope clients expect.
// Authentication lives upstream; the acting user id arrives in the request.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::{CommentId, PostId, UserId};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub name: String,
    pub profile_image: Option<String>,
}

#[derive(Deserialize)]
pub struct FollowRequest {
    pub follower_id: UserId,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct DeletePostRequest {
    pub author_id: UserId,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author_id: UserId,
    pub content: String,
}

#[derive(Deserialize)]
pub struct LikeRequest {
    pub user_id: UserId,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer_id: Option<UserId>,
}

#[derive(Deserialize)]
pub struct ThreadQuery {
    pub root_comment_id: Option<CommentId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .users
        .create_user(&req.username, &req.name, req.profile_image.as_deref())
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "User registered successfully",
        "data": user
    })))
}

async fn get_user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<Value>, AppError> {
    let profile = state.users.get_profile(&username, query.viewer_id).await?;
    Ok(Json(json!({"status": "success", "data": profile})))
}

async fn follow_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<Value>, AppError> {
    let following = state.users.follow(req.follower_id, user_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "User followed successfully",
        "data": following
    })))
}

async fn unfollow_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<Value>, AppError> {
    let following = state.users.unfollow(req.follower_id, user_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "User unfollowed successfully",
        "data": following
    })))
}

async fn get_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<Value>, AppError> {
    let viewer_id = query.viewer_id.unwrap_or(user_id);
    let posts = state.posts.list_user_posts(user_id, viewer_id).await?;
    Ok(Json(json!({"status": "success", "data": posts})))
}

async fn get_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Value>, AppError> {
    let notifications = state.users.list_notifications(user_id).await?;
    Ok(Json(json!({"status": "success", "data": notifications})))
}

async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let (posts, has_more) = state.feed.list_feed(page, limit).await?;
    Ok(Json(json!({
        "status": "success",
        "hasMore": has_more,
        "page": page,
        "data": posts
    })))
}

async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Value>, AppError> {
    let post = state
        .posts
        .create_post(req.author_id, &req.title, &req.content)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Post created successfully",
        "data": post
    })))
}

async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Value>, AppError> {
    let post = state
        .posts
        .update_post(post_id, req.author_id, &req.title, &req.content)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Post updated successfully",
        "data": post
    })))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Json(req): Json<DeletePostRequest>,
) -> Result<Json<Value>, AppError> {
    state.posts.delete_post(post_id, req.author_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Post deleted successfully"
    })))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let comment = state
        .comments
        .create_root_comment(post_id, req.author_id, &req.content)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Comment posted successfully",
        "data": comment
    })))
}

async fn create_comment_reply(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(PostId, CommentId)>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let comment = state
        .comments
        .create_reply(post_id, comment_id, req.author_id, &req.content)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Reply posted successfully",
        "data": comment
    })))
}

async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<Value>, AppError> {
    if let Some(root_comment_id) = query.root_comment_id {
        let thread = state
            .threads
            .get_thread(post_id, Some(root_comment_id))
            .await?;
        return Ok(Json(json!({"status": "success", "data": thread})));
    }

    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let (thread, has_more) = state.threads.get_thread_page(post_id, page, limit).await?;
    Ok(Json(json!({
        "status": "success",
        "hasMore": has_more,
        "page": page,
        "data": thread
    })))
}

async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<Value>, AppError> {
    state.posts.like_post(post_id, req.user_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Post liked successfully"
    })))
}

async fn unlike_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<Value>, AppError> {
    state.posts.unlike_post(post_id, req.user_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Post like removed successfully"
    })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Users
        .route("/users", post(register_user))
        .route("/users/{username}/profile", get(get_user_profile))
        .route("/users/{user_id}/follow", post(follow_user).delete(unfollow_user))
        .route("/users/{user_id}/posts", get(get_user_posts))
        .route("/users/{user_id}/notifications", get(get_notifications))
        // Posts
        .route("/posts", get(get_posts).post(create_post))
        .route("/posts/{id}", put(update_post).delete(delete_post))
        .route("/posts/{post_id}/likes", post(like_post).delete(unlike_post))
        // Comments
        .route(
            "/posts/{post_id}/comments",
            get(get_post_comments).post(create_comment),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}/replies",
            post(create_comment_reply),
        )
        .with_state(state)
}
