use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Completed,
    NoUserFound,
    /// User found but clearing their Facebook data failed
    Failed,
}

impl DeletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionStatus::Completed => "completed",
            DeletionStatus::NoUserFound => "no_user_found",
            DeletionStatus::Failed => "failed",
        }
    }
}

/// Facebook data deletion callback, looked up later by confirmation code
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DataDeletionRequest {
    pub id: Uuid,
    pub fb_user_id: String,
    pub user_id: Option<Uuid>,
    pub confirmation_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
