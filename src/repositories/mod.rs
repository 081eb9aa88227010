pub mod data_deletion_repository;
pub mod event_repository;
pub mod friendship_repository;
pub mod group_member_repository;
pub mod group_repository;
pub mod order_repository;
pub mod sync_attempt_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use data_deletion_repository::DataDeletionRepository;
pub use event_repository::EventRepository;
pub use friendship_repository::FriendshipRepository;
pub use group_member_repository::GroupMemberRepository;
pub use group_repository::{GroupRepository, GroupSchedule};
pub use order_repository::{NewOrder, OrderRepository, PaymentNotice};
pub use sync_attempt_repository::SyncAttemptRepository;
pub use user_repository::UserRepository;
