use crate::models::{LinkedUser, User};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, nickname: Option<&str>, fb_user_id: Option<&str>) -> SqlxResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (nickname, fb_user_id, fb_connected_at)
            VALUES ($1, $2, CASE WHEN $2 IS NULL THEN NULL ELSE now() END)
            RETURNING id, nickname, fb_user_id, fb_access_token, fb_connected_at,
                      fb_last_sync_at, fb_last_sync_status, created_at
            "#,
        )
        .bind(nickname)
        .bind(fb_user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, nickname, fb_user_id, fb_access_token, fb_connected_at,
                   fb_last_sync_at, fb_last_sync_status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by Facebook user id
    pub async fn find_by_fb_user_id(&self, fb_user_id: &str) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, nickname, fb_user_id, fb_access_token, fb_connected_at,
                   fb_last_sync_at, fb_last_sync_status, created_at
            FROM users
            WHERE fb_user_id = $1
            "#,
        )
        .bind(fb_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// App users whose Facebook id is in `fb_user_ids`
    pub async fn find_linked_by_fb_ids(&self, fb_user_ids: &[String]) -> SqlxResult<Vec<LinkedUser>> {
        if fb_user_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, LinkedUser>(
            r#"
            SELECT id, fb_user_id
            FROM users
            WHERE fb_user_id = ANY($1)
            "#,
        )
        .bind(fb_user_ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Persist a long-lived Graph token for unattended syncs
    pub async fn store_access_token(&self, user_id: Uuid, access_token: &str) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET fb_access_token = $2,
                fb_connected_at = COALESCE(fb_connected_at, now())
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Record a successful sync
    pub async fn mark_sync_success(&self, user_id: Uuid) -> SqlxResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET fb_last_sync_at = now(),
                fb_last_sync_status = 'success'
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop an expired or revoked token so it is not retried by later batches
    pub async fn clear_invalid_token(&self, user_id: Uuid) -> SqlxResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET fb_access_token = NULL,
                fb_last_sync_status = 'failed'
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove every Facebook-derived field from a user
    pub async fn clear_facebook_data(&self, user_id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET fb_user_id = NULL,
                fb_connected_at = NULL,
                fb_last_sync_at = NULL,
                fb_last_sync_status = NULL,
                fb_access_token = NULL
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
