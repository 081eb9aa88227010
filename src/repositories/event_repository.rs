use crate::models::{Event, EventStatus, SyncCandidate};
use chrono::NaiveDate;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for events and their bookings
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new EventRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event
    pub async fn create(
        &self,
        event_date: NaiveDate,
        status: EventStatus,
        default_group_size: i32,
    ) -> SqlxResult<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (event_date, status, default_group_size)
            VALUES ($1, $2, $3)
            RETURNING id, category, event_date, time_slot, status, default_group_size, created_at
            "#,
        )
        .bind(event_date)
        .bind(status.as_str())
        .bind(default_group_size)
        .fetch_one(&self.pool)
        .await
    }

    /// Find an event by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, category, event_date, time_slot, status, default_group_size, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Scheduled events taking place on `date`
    pub async fn find_scheduled_on(&self, date: NaiveDate) -> SqlxResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, category, event_date, time_slot, status, default_group_size, created_at
            FROM events
            WHERE event_date = $1 AND status = 'scheduled'
            ORDER BY created_at ASC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
    }

    /// Register a user for an event, returning the booking id
    pub async fn create_booking(&self, event_id: Uuid, user_id: Uuid) -> SqlxResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO bookings (event_id, user_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Active registrants of an event who have linked Facebook
    pub async fn find_linked_registrants(&self, event_id: Uuid) -> SqlxResult<Vec<SyncCandidate>> {
        sqlx::query_as::<_, SyncCandidate>(
            r#"
            SELECT u.id AS user_id, u.fb_user_id, u.fb_access_token
            FROM bookings b
            JOIN users u ON u.id = b.user_id
            WHERE b.event_id = $1
              AND b.status = 'active'
              AND u.fb_user_id IS NOT NULL
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Run the database grouping procedure; returns the number of groups created
    pub async fn auto_seed_groups(&self, event_id: Uuid) -> SqlxResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT auto_seed_groups_for_event($1)")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
    }
}
