use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Group lifecycle: `draft -> scheduled` on confirmation, `scheduled -> draft` on unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Draft,
    Scheduled,
    Cancelled,
}

impl GroupStatus {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Draft => "draft",
            GroupStatus::Scheduled => "scheduled",
            GroupStatus::Cancelled => "cancelled",
        }
    }

    /// Whether an admin may move a group from `self` to `next`
    pub fn can_transition_to(&self, next: GroupStatus) -> bool {
        matches!(
            (self, next),
            (GroupStatus::Draft, GroupStatus::Scheduled) | (GroupStatus::Scheduled, GroupStatus::Draft)
        )
    }
}

impl FromStr for GroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(GroupStatus::Draft),
            "scheduled" => Ok(GroupStatus::Scheduled),
            "cancelled" => Ok(GroupStatus::Cancelled),
            _ => Err(format!("Invalid group status: {}", s)),
        }
    }
}

/// Fixed-capacity group of event registrants
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub event_id: Uuid,
    pub venue_id: Option<Uuid>,
    pub max_size: i32,
    pub status: String, // Stored as TEXT, use GroupStatus enum for type safety
    pub chat_open_at: Option<DateTime<Utc>>,
    pub goal_close_at: Option<DateTime<Utc>>,
    pub feedback_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Get status as an enum
    pub fn status_enum(&self) -> GroupStatus {
        self.status.parse().unwrap_or(GroupStatus::Draft)
    }

    pub fn is_draft(&self) -> bool {
        self.status_enum() == GroupStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_status_round_trip_strings() {
        for status in [GroupStatus::Draft, GroupStatus::Scheduled, GroupStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<GroupStatus>().unwrap(), status);
        }
        assert!("locked".parse::<GroupStatus>().is_err());
    }

    #[test]
    fn test_only_confirm_and_unlock_transitions_are_allowed() {
        assert!(GroupStatus::Draft.can_transition_to(GroupStatus::Scheduled));
        assert!(GroupStatus::Scheduled.can_transition_to(GroupStatus::Draft));
        assert!(!GroupStatus::Draft.can_transition_to(GroupStatus::Cancelled));
        assert!(!GroupStatus::Cancelled.can_transition_to(GroupStatus::Draft));
        assert!(!GroupStatus::Scheduled.can_transition_to(GroupStatus::Scheduled));
    }
}
