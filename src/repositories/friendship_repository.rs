use crate::models::{FriendPair, Friendship};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for friendship edges
pub struct FriendshipRepository {
    pool: PgPool,
}

impl FriendshipRepository {
    /// Create a new FriendshipRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the edge or refresh `last_seen_at`/`updated_at` when it already exists
    pub async fn upsert(&self, pair: FriendPair) -> SqlxResult<Friendship> {
        sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (user_low_id, user_high_id, last_seen_at, updated_at)
            VALUES ($1, $2, now(), now())
            ON CONFLICT (user_low_id, user_high_id) DO UPDATE
            SET last_seen_at = EXCLUDED.last_seen_at,
                updated_at = EXCLUDED.updated_at
            RETURNING user_low_id, user_high_id, created_at, updated_at, last_seen_at
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_one(&self.pool)
        .await
    }

    /// Find the edge between two users, in either argument order
    pub async fn find(&self, pair: FriendPair) -> SqlxResult<Option<Friendship>> {
        sqlx::query_as::<_, Friendship>(
            r#"
            SELECT user_low_id, user_high_id, created_at, updated_at, last_seen_at
            FROM friendships
            WHERE user_low_id = $1 AND user_high_id = $2
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await
    }

    /// All edges touching a user
    pub async fn find_for_user(&self, user_id: Uuid) -> SqlxResult<Vec<Friendship>> {
        sqlx::query_as::<_, Friendship>(
            r#"
            SELECT user_low_id, user_high_id, created_at, updated_at, last_seen_at
            FROM friendships
            WHERE user_low_id = $1 OR user_high_id = $1
            ORDER BY last_seen_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
