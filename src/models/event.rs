use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Scheduled,
    Notified,
    Cancelled,
    Completed,
}

impl EventStatus {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Scheduled => "scheduled",
            EventStatus::Notified => "notified",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "scheduled" => Ok(EventStatus::Scheduled),
            "notified" => Ok(EventStatus::Notified),
            "cancelled" => Ok(EventStatus::Cancelled),
            "completed" => Ok(EventStatus::Completed),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

/// Event that students register for and get grouped in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub category: String,
    pub event_date: NaiveDate,
    pub time_slot: String,
    pub status: String, // Stored as TEXT, use EventStatus enum for type safety
    pub default_group_size: i32,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Get status as an enum
    pub fn status_enum(&self) -> EventStatus {
        self.status.parse().unwrap_or(EventStatus::Draft)
    }
}
