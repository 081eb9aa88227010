use crate::models::Group;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Scheduling fields written together with the `scheduled` status
#[derive(Debug, Clone, Default)]
pub struct GroupSchedule {
    pub venue_id: Option<Uuid>,
    pub chat_open_at: Option<DateTime<Utc>>,
    pub goal_close_at: Option<DateTime<Utc>>,
    pub feedback_sent_at: Option<DateTime<Utc>>,
}

/// Repository for group data access
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new GroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new draft group
    pub async fn create(&self, event_id: Uuid, max_size: i32) -> SqlxResult<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (event_id, max_size)
            VALUES ($1, $2)
            RETURNING id, event_id, venue_id, max_size, status,
                      chat_open_at, goal_close_at, feedback_sent_at, created_at
            "#,
        )
        .bind(event_id)
        .bind(max_size)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a group by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT id, event_id, venue_id, max_size, status,
                   chat_open_at, goal_close_at, feedback_sent_at, created_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find all groups of an event
    pub async fn find_by_event(&self, event_id: Uuid) -> SqlxResult<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT id, event_id, venue_id, max_size, status,
                   chat_open_at, goal_close_at, feedback_sent_at, created_at
            FROM groups
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Flip a group to `scheduled` in one statement.
    ///
    /// The `handle_group_status_scheduled` trigger validates capacity, venue,
    /// timing and the no-friends rule; a rejection surfaces as a database error
    /// and the row stays unchanged. `None` means the group does not exist.
    pub async fn schedule(&self, id: Uuid, schedule: &GroupSchedule) -> SqlxResult<Option<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET status = 'scheduled',
                venue_id = COALESCE($2, venue_id),
                chat_open_at = COALESCE($3, chat_open_at),
                goal_close_at = COALESCE($4, goal_close_at),
                feedback_sent_at = COALESCE($5, feedback_sent_at)
            WHERE id = $1
            RETURNING id, event_id, venue_id, max_size, status,
                      chat_open_at, goal_close_at, feedback_sent_at, created_at
            "#,
        )
        .bind(id)
        .bind(schedule.venue_id)
        .bind(schedule.chat_open_at)
        .bind(schedule.goal_close_at)
        .bind(schedule.feedback_sent_at)
        .fetch_optional(&self.pool)
        .await
    }

    /// Move a scheduled group back to draft; `None` when it was not scheduled
    pub async fn unlock(&self, id: Uuid) -> SqlxResult<Option<Group>> {
        sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET status = 'draft'
            WHERE id = $1 AND status = 'scheduled'
            RETURNING id, event_id, venue_id, max_size, status,
                      chat_open_at, goal_close_at, feedback_sent_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a group while it is still a draft; members cascade
    pub async fn delete_draft(&self, id: Uuid) -> SqlxResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM groups
            WHERE id = $1 AND status = 'draft'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
