use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }
}

/// Audit row written for every friend sync
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendSyncAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub friends_count: Option<i32>,
    pub error_message: Option<String>,
    pub raw_response: Option<Value>,
    pub created_at: DateTime<Utc>,
}
