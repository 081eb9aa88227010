use crate::models::{FriendSyncAttempt, SyncStatus};
use serde_json::Value;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for the friend sync audit log
pub struct SyncAttemptRepository {
    pool: PgPool,
}

impl SyncAttemptRepository {
    /// Create a new SyncAttemptRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one attempt
    pub async fn record(
        &self,
        user_id: Uuid,
        status: SyncStatus,
        friends_count: Option<i32>,
        error_message: Option<&str>,
        raw_response: &Value,
    ) -> SqlxResult<FriendSyncAttempt> {
        sqlx::query_as::<_, FriendSyncAttempt>(
            r#"
            INSERT INTO fb_friend_sync_attempts (user_id, status, friends_count, error_message, raw_response)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, status, friends_count, error_message, raw_response, created_at
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(friends_count)
        .bind(error_message)
        .bind(raw_response)
        .fetch_one(&self.pool)
        .await
    }

    /// Attempts of a user, newest first
    pub async fn find_by_user(&self, user_id: Uuid) -> SqlxResult<Vec<FriendSyncAttempt>> {
        sqlx::query_as::<_, FriendSyncAttempt>(
            r#"
            SELECT id, user_id, status, friends_count, error_message, raw_response, created_at
            FROM fb_friend_sync_attempts
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
