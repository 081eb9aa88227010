use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User account, optionally linked to a Facebook identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub nickname: Option<String>,
    pub fb_user_id: Option<String>,
    /// Long-lived Graph token kept for unattended syncs; never serialized
    #[serde(skip_serializing, default)]
    pub fb_access_token: Option<String>,
    pub fb_connected_at: Option<DateTime<Utc>>,
    pub fb_last_sync_at: Option<DateTime<Utc>>,
    pub fb_last_sync_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether an unattended friend sync is possible for this user
    pub fn has_stored_token(&self) -> bool {
        self.fb_access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// App user matched by external Facebook id
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LinkedUser {
    pub id: Uuid,
    pub fb_user_id: String,
}
