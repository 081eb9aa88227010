use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Group Member model linking a group to a booking; `left_at` marks soft removal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub booking_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl GroupMember {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// A registrant resolved to the user behind the booking, with their stored Graph token
#[derive(Debug, Clone, FromRow)]
pub struct SyncCandidate {
    pub user_id: Uuid,
    pub fb_user_id: Option<String>,
    pub fb_access_token: Option<String>,
}

impl SyncCandidate {
    /// Stored token, if any and non-empty
    pub fn token(&self) -> Option<&str> {
        self.fb_access_token.as_deref().filter(|t| !t.is_empty())
    }
}
