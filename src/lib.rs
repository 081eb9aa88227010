//! Campus Nerds Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod ecpay;
pub mod error;
pub mod facebook;
pub mod html;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::SupabaseAuthClient;
use database::Database;
use facebook::GraphClient;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub config: AppConfig,
    pub database: Database,
    pub auth: SupabaseAuthClient,
    pub user_repo: Arc<UserRepository>,
    pub friendship_repo: Arc<FriendshipRepository>,
    pub group_repo: Arc<GroupRepository>,
    pub group_member_repo: Arc<GroupMemberRepository>,
    pub event_repo: Arc<EventRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub friend_sync: Arc<FriendSyncService>,
    pub group_confirmation: Arc<GroupConfirmationService>,
    pub auto_grouping: Arc<AutoGroupingService>,
    pub payments: Arc<PaymentService>,
    pub data_deletion: Arc<DataDeletionService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> Self {
        let database = Database::new(pool.clone());

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let friendship_repo = Arc::new(FriendshipRepository::new(pool.clone()));
        let group_repo = Arc::new(GroupRepository::new(pool.clone()));
        let group_member_repo = Arc::new(GroupMemberRepository::new(pool.clone()));
        let event_repo = Arc::new(EventRepository::new(pool.clone()));
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let attempt_repo = Arc::new(SyncAttemptRepository::new(pool.clone()));
        let deletion_repo = Arc::new(DataDeletionRepository::new(pool));

        let graph = Arc::new(GraphClient::new(&config.facebook));
        let friend_sync = Arc::new(FriendSyncService::new(
            graph,
            user_repo.clone(),
            friendship_repo.clone(),
            attempt_repo,
        ));

        let group_confirmation = Arc::new(GroupConfirmationService::new(
            group_repo.clone(),
            group_member_repo.clone(),
            friend_sync.clone(),
        ));
        let auto_grouping = Arc::new(AutoGroupingService::new(
            event_repo.clone(),
            friend_sync.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            order_repo.clone(),
            config.ecpay.clone(),
            &config.supabase.url,
        ));
        let data_deletion = Arc::new(DataDeletionService::new(
            user_repo.clone(),
            deletion_repo,
            config.facebook.app_secret.clone(),
            config.public_functions_url.clone(),
        ));

        Self {
            auth: SupabaseAuthClient::new(&config.supabase),
            config,
            database,
            user_repo,
            friendship_repo,
            group_repo,
            group_member_repo,
            event_repo,
            order_repo,
            friend_sync,
            group_confirmation,
            auto_grouping,
            payments,
            data_deletion,
        }
    }
}
