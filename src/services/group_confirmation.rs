use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{Group, GroupStatus};
use crate::repositories::{GroupMemberRepository, GroupRepository, GroupSchedule};
use crate::services::friend_sync::{FriendSyncService, SyncSummary};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Substring of the trigger message raised when members are friends
pub const FRIENDS_REJECTION_MARKER: &str = "Facebook friends";

/// Result of a confirmation attempt that reached the status update
#[derive(Debug)]
pub enum ConfirmOutcome {
    Confirmed {
        group: Group,
        sync: SyncSummary,
    },
    /// Two active members are Facebook friends
    ContainsFriends {
        message: String,
        sync: SyncSummary,
    },
    /// Any other validation failure (not full, no venue, timing unset, ...)
    Rejected {
        message: String,
        sync: SyncSummary,
    },
}

impl ConfirmOutcome {
    pub fn sync(&self) -> SyncSummary {
        match self {
            ConfirmOutcome::Confirmed { sync, .. }
            | ConfirmOutcome::ContainsFriends { sync, .. }
            | ConfirmOutcome::Rejected { sync, .. } => *sync,
        }
    }
}

/// Moves groups between draft and scheduled
pub struct GroupConfirmationService {
    group_repo: Arc<GroupRepository>,
    member_repo: Arc<GroupMemberRepository>,
    friend_sync: Arc<FriendSyncService>,
}

impl GroupConfirmationService {
    pub fn new(
        group_repo: Arc<GroupRepository>,
        member_repo: Arc<GroupMemberRepository>,
        friend_sync: Arc<FriendSyncService>,
    ) -> Self {
        Self {
            group_repo,
            member_repo,
            friend_sync,
        }
    }

    async fn load(&self, group_id: Uuid) -> AppResult<Group> {
        self.group_repo
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    /// Refresh the members' friendships, then try `draft -> scheduled`.
    ///
    /// Sync side effects stay in place whatever the update does.
    pub async fn confirm(&self, group_id: Uuid, schedule: &GroupSchedule) -> AppResult<ConfirmOutcome> {
        info!("Confirming group {}", group_id);
        self.load(group_id).await?;

        let members = self
            .member_repo
            .find_sync_candidates(group_id)
            .await
            .map_err(|e| {
                error!("Failed to fetch members of group {}: {}", group_id, e);
                AppError::Internal("Failed to fetch group members".to_string())
            })?;

        let sync = self.friend_sync.sync_candidates(&members).await;
        info!(
            "Group {}: synced {} of {} members ({} errors, {} friendships)",
            group_id,
            sync.users_synced,
            members.len(),
            sync.sync_errors,
            sync.friendships_found
        );

        match self.group_repo.schedule(group_id, schedule).await {
            Ok(Some(group)) => {
                info!("Group {} scheduled", group_id);
                Ok(ConfirmOutcome::Confirmed { group, sync })
            }
            Ok(None) => Err(AppError::NotFound("Group not found".to_string())),
            Err(e) => match RepositoryError::from(e) {
                RepositoryError::Query(e) => Err(AppError::Sqlx(e)),
                rejection => {
                    let message = rejection.message();
                    warn!("Group {} confirmation rejected: {}", group_id, message);
                    if message.contains(FRIENDS_REJECTION_MARKER) {
                        Ok(ConfirmOutcome::ContainsFriends { message, sync })
                    } else {
                        Ok(ConfirmOutcome::Rejected { message, sync })
                    }
                }
            },
        }
    }

    /// Move a scheduled group back to draft
    pub async fn unlock(&self, group_id: Uuid) -> AppResult<Group> {
        let group = self.load(group_id).await?;
        if !group.status_enum().can_transition_to(GroupStatus::Draft) {
            return Err(AppError::BusinessLogic(format!(
                "Only scheduled groups can be unlocked (current status: {})",
                group.status
            )));
        }

        let group = self.group_repo.unlock(group_id).await?.ok_or_else(|| {
            AppError::BusinessLogic("Group is no longer scheduled".to_string())
        })?;

        info!("Group {} unlocked back to draft", group_id);
        Ok(group)
    }

    /// Delete a draft group together with its member rows
    pub async fn delete(&self, group_id: Uuid) -> AppResult<()> {
        let group = self.load(group_id).await?;
        if !group.is_draft() {
            return Err(AppError::BusinessLogic(format!(
                "Only draft groups can be deleted (current status: {})",
                group.status
            )));
        }

        if !self.group_repo.delete_draft(group_id).await? {
            return Err(AppError::BusinessLogic(
                "Group is no longer a draft".to_string(),
            ));
        }

        info!("Deleted draft group {}", group_id);
        Ok(())
    }
}
