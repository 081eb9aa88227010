use crate::models::{DataDeletionRequest, DeletionStatus};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for Facebook data deletion requests
pub struct DataDeletionRepository {
    pool: PgPool,
}

impl DataDeletionRepository {
    /// Create a new DataDeletionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Log a processed deletion request
    pub async fn record(
        &self,
        fb_user_id: &str,
        user_id: Option<Uuid>,
        confirmation_code: &str,
        status: DeletionStatus,
    ) -> SqlxResult<DataDeletionRequest> {
        sqlx::query_as::<_, DataDeletionRequest>(
            r#"
            INSERT INTO fb_data_deletion_requests (fb_user_id, user_id, confirmation_code, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, fb_user_id, user_id, confirmation_code, status, created_at
            "#,
        )
        .bind(fb_user_id)
        .bind(user_id)
        .bind(confirmation_code)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
    }

    /// Find a request by its confirmation code
    pub async fn find_by_code(&self, confirmation_code: &str) -> SqlxResult<Option<DataDeletionRequest>> {
        sqlx::query_as::<_, DataDeletionRequest>(
            r#"
            SELECT id, fb_user_id, user_id, confirmation_code, status, created_at
            FROM fb_data_deletion_requests
            WHERE confirmation_code = $1
            "#,
        )
        .bind(confirmation_code)
        .fetch_optional(&self.pool)
        .await
    }
}
