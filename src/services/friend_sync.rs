use crate::facebook::{GraphClient, GraphError};
use crate::models::{FriendPair, SyncCandidate, SyncStatus};
use crate::repositories::{FriendshipRepository, SyncAttemptRepository, UserRepository};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Errors from a single user's friend sync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counters of one successful sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub total_fb_friends: usize,
    pub matched_app_users: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Aggregate over several users, as reported by confirmation and batch runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub users_synced: usize,
    pub sync_errors: usize,
    pub friendships_found: usize,
}

impl SyncSummary {
    fn record(&mut self, result: &Result<SyncOutcome, SyncError>) {
        match result {
            Ok(outcome) => {
                self.users_synced += 1;
                self.friendships_found += outcome.inserted;
            }
            Err(_) => self.sync_errors += 1,
        }
    }
}

/// Pulls a user's Facebook friends and stores the ones who use the app
pub struct FriendSyncService {
    graph: Arc<GraphClient>,
    user_repo: Arc<UserRepository>,
    friendship_repo: Arc<FriendshipRepository>,
    attempt_repo: Arc<SyncAttemptRepository>,
}

impl FriendSyncService {
    pub fn new(
        graph: Arc<GraphClient>,
        user_repo: Arc<UserRepository>,
        friendship_repo: Arc<FriendshipRepository>,
        attempt_repo: Arc<SyncAttemptRepository>,
    ) -> Self {
        Self {
            graph,
            user_repo,
            friendship_repo,
            attempt_repo,
        }
    }

    /// Sync one user's friends with the given access token.
    ///
    /// Upserts are best-effort: a failed pair is counted as skipped and the
    /// rest continue. A Graph error is recorded and returned without retry;
    /// an invalid token (code 190) is also cleared from the user.
    pub async fn sync_user(&self, user_id: Uuid, access_token: &str) -> Result<SyncOutcome, SyncError> {
        let friends = match self.graph.fetch_friends(access_token).await {
            Ok(friends) => friends,
            Err(err) => {
                self.record_failure(user_id, &err).await;
                return Err(err.into());
            }
        };

        let friend_ids = friends.ids();
        let linked = self.user_repo.find_linked_by_fb_ids(&friend_ids).await?;

        let mut outcome = SyncOutcome {
            total_fb_friends: friend_ids.len(),
            matched_app_users: linked.len(),
            ..Default::default()
        };

        for friend in &linked {
            let Some(pair) = FriendPair::new(user_id, friend.id) else {
                continue;
            };

            match self.friendship_repo.upsert(pair).await {
                Ok(_) => outcome.inserted += 1,
                Err(e) => {
                    outcome.skipped += 1;
                    warn!("Friendship upsert failed for {} / {}: {}", pair.low(), pair.high(), e);
                }
            }
        }

        self.user_repo.mark_sync_success(user_id).await?;

        let summary = json!({
            "total_fb_friends": outcome.total_fb_friends,
            "matched_app_users": outcome.matched_app_users,
            "inserted_friendships": outcome.inserted,
            "skipped_duplicates": outcome.skipped,
        });
        self.attempt_repo
            .record(
                user_id,
                SyncStatus::Success,
                Some(outcome.inserted as i32),
                None,
                &summary,
            )
            .await?;

        info!(
            "Synced friends for user {}: {} from Facebook, {} app users, {} stored",
            user_id, outcome.total_fb_friends, outcome.matched_app_users, outcome.inserted
        );

        Ok(outcome)
    }

    /// Sync on behalf of the user themself, optionally keeping a long-lived token.
    ///
    /// When the exchange fails the caller's token is used and nothing is stored.
    pub async fn sync_with_token(
        &self,
        user_id: Uuid,
        access_token: &str,
        store_token: bool,
    ) -> Result<SyncOutcome, SyncError> {
        if !store_token {
            return self.sync_user(user_id, access_token).await;
        }

        match self.graph.exchange_token(access_token).await {
            Ok(long_lived) => {
                if let Err(e) = self
                    .user_repo
                    .store_access_token(user_id, &long_lived.access_token)
                    .await
                {
                    error!("Failed to store long-lived token for user {}: {}", user_id, e);
                }
                self.sync_user(user_id, &long_lived.access_token).await
            }
            Err(e) => {
                warn!("Token exchange failed for user {}: {}", user_id, e);
                self.sync_user(user_id, access_token).await
            }
        }
    }

    /// Sync every candidate holding a stored token, one after another
    pub async fn sync_candidates(&self, candidates: &[SyncCandidate]) -> SyncSummary {
        let mut summary = SyncSummary::default();

        for candidate in candidates {
            let Some(token) = candidate.token() else {
                debug!("User {} has no stored token, skipping sync", candidate.user_id);
                continue;
            };

            let result = self.sync_user(candidate.user_id, token).await;
            if let Err(e) = &result {
                warn!("Friend sync failed for user {}: {}", candidate.user_id, e);
            }
            summary.record(&result);
        }

        summary
    }

    async fn record_failure(&self, user_id: Uuid, err: &GraphError) {
        warn!("Graph friends request failed for user {}: {}", user_id, err);

        if let Err(e) = self
            .attempt_repo
            .record(
                user_id,
                SyncStatus::Failed,
                None,
                Some(&err.message()),
                &err.to_json(),
            )
            .await
        {
            error!("Failed to record sync attempt for user {}: {}", user_id, e);
        }

        if err.is_token_invalid() {
            info!("Clearing invalid Facebook token for user {}", user_id);
            if let Err(e) = self.user_repo.clear_invalid_token(user_id).await {
                error!("Failed to clear token for user {}: {}", user_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_successes_and_errors() {
        let mut summary = SyncSummary::default();
        summary.record(&Ok(SyncOutcome {
            inserted: 3,
            ..Default::default()
        }));
        summary.record(&Ok(SyncOutcome {
            inserted: 1,
            ..Default::default()
        }));
        summary.record(&Err(SyncError::Graph(GraphError::Api {
            code: 190,
            message: "expired".into(),
            kind: None,
        })));

        assert_eq!(
            summary,
            SyncSummary {
                users_synced: 2,
                sync_errors: 1,
                friendships_found: 4
            }
        );
    }

    #[test]
    fn test_summary_serializes_with_response_field_names() {
        let value = serde_json::to_value(SyncSummary::default()).unwrap();
        assert_eq!(value["users_synced"], 0);
        assert_eq!(value["sync_errors"], 0);
        assert_eq!(value["friendships_found"], 0);
    }
}
