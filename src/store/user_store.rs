// User store: accounts, profiles, and follow bookkeeping. Authentication
// lives upstream; callers supply the acting user id.

use chrono::Utc;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Notification, User, UserId, UserProfile};
use crate::sanitize::sanitize_required;
use crate::store::database::Database;

#[derive(Clone)]
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        username: &str,
        name: &str,
        profile_image: Option<&str>,
    ) -> AppResult<User> {
        let username = sanitize_required(username, "Username")?;
        let name = sanitize_required(name, "Name")?;
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (username, name, profile_image, created, updated)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&username)
        .bind(&name)
        .bind(profile_image)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation("Username already taken".to_string()));
        }

        Ok(User {
            id: result.last_insert_rowid(),
            username,
            name,
            profile_image: profile_image.map(str::to_string),
            created: now,
            updated: now,
        })
    }

    pub async fn fetch_by_username(&self, username: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, name, profile_image, created, updated
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to load user {}: {}", username, e)))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Profile with post and follow counts. `viewer_id` marks whether the
    /// viewer already follows this user.
    pub async fn get_profile(
        &self,
        username: &str,
        viewer_id: Option<UserId>,
    ) -> AppResult<UserProfile> {
        let user = self.fetch_by_username(username).await?;

        let total_posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(user.id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to count posts of user {}: {}", user.id, e))
            })?;

        let followers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE following_id = ?")
                .bind(user.id)
                .fetch_one(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to count followers of user {}: {}",
                        user.id, e
                    ))
                })?;

        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = ?")
                .bind(user.id)
                .fetch_one(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to count follows of user {}: {}",
                        user.id, e
                    ))
                })?;

        let is_following = match viewer_id {
            Some(viewer_id) => {
                sqlx::query("SELECT 1 FROM followers WHERE follower_id = ? AND following_id = ?")
                    .bind(viewer_id)
                    .bind(user.id)
                    .fetch_optional(self.db.pool())
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(format!("Failed to check follow state: {}", e))
                    })?
                    .is_some()
            }
            None => false,
        };

        Ok(UserProfile {
            id: user.id,
            username: user.username,
            name: user.name,
            profile_image: user.profile_image,
            total_posts,
            followers,
            following,
            is_following,
        })
    }

    /// Follow `user_id` and notify them, in one transaction. Returns how many
    /// users the follower now follows.
    pub async fn follow(&self, follower_id: UserId, user_id: UserId) -> AppResult<i64> {
        if follower_id == user_id {
            return Err(AppError::Validation(
                "You cannot follow yourself".to_string(),
            ));
        }
        if !self.db.user_exists(follower_id).await? || !self.db.user_exists(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let follower_username: String =
            sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
                .bind(follower_id)
                .fetch_one(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to load user {}: {}", follower_id, e))
                })?;

        let now = Utc::now().timestamp_millis();
        let mut tx = self.db.begin_transaction().await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO followers (follower_id, following_id, created) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to follow user {}: {}", user_id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(
                "Already following this user".to_string(),
            ));
        }

        sqlx::query("INSERT INTO notifications (user_id, message, created) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(format!("{} followed you", follower_username))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to notify user {}: {}", user_id, e))
            })?;

        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = ?")
                .bind(follower_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to count follows of user {}: {}",
                        follower_id, e
                    ))
                })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit follow: {}", e)))?;

        Ok(following)
    }

    /// Drop the follow edge. Returns how many users the follower still follows.
    pub async fn unfollow(&self, follower_id: UserId, user_id: UserId) -> AppResult<i64> {
        let mut tx = self.db.begin_transaction().await?;

        let result = sqlx::query("DELETE FROM followers WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to unfollow user {}: {}", user_id, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "You are not following this user".to_string(),
            ));
        }

        let following: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE follower_id = ?")
                .bind(follower_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to count follows of user {}: {}",
                        follower_id, e
                    ))
                })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit unfollow: {}", e)))?;

        Ok(following)
    }

    pub async fn list_notifications(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, message, created FROM notifications
             WHERE user_id = ? ORDER BY created DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list notifications of user {}: {}",
                user_id, e
            ))
        })
    }
}
