use crate::models::{GroupMember, SyncCandidate};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for group member data access
pub struct GroupMemberRepository {
    pool: PgPool,
}

impl GroupMemberRepository {
    /// Create a new GroupMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a booking to a group
    pub async fn add_member(&self, group_id: Uuid, booking_id: Uuid) -> SqlxResult<GroupMember> {
        sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, booking_id)
            VALUES ($1, $2)
            RETURNING id, group_id, booking_id, joined_at, left_at
            "#,
        )
        .bind(group_id)
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Soft-remove a booking from a group
    pub async fn remove_member(&self, group_id: Uuid, booking_id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE group_members
            SET left_at = now()
            WHERE group_id = $1 AND booking_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(group_id)
        .bind(booking_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Active members of a group
    pub async fn find_active_by_group(&self, group_id: Uuid) -> SqlxResult<Vec<GroupMember>> {
        sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT id, group_id, booking_id, joined_at, left_at
            FROM group_members
            WHERE group_id = $1 AND left_at IS NULL
            ORDER BY joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Users behind the active members of a group, with their stored tokens
    pub async fn find_sync_candidates(&self, group_id: Uuid) -> SqlxResult<Vec<SyncCandidate>> {
        sqlx::query_as::<_, SyncCandidate>(
            r#"
            SELECT u.id AS user_id, u.fb_user_id, u.fb_access_token
            FROM group_members gm
            JOIN bookings b ON b.id = gm.booking_id
            JOIN users u ON u.id = b.user_id
            WHERE gm.group_id = $1 AND gm.left_at IS NULL
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Number of active members in a group
    pub async fn count_active(&self, group_id: Uuid) -> SqlxResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM group_members
            WHERE group_id = $1 AND left_at IS NULL
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await
    }
}
