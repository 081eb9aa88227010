//! Domain models for the Campus Nerds backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the event and grouping platform.

pub mod data_deletion;
pub mod event;
pub mod friendship;
pub mod group;
pub mod group_member;
pub mod order;
pub mod sync_attempt;
pub mod user;

// Re-export all models for convenient access
pub use data_deletion::{DataDeletionRequest, DeletionStatus};
pub use event::{Event, EventStatus};
pub use friendship::{FriendPair, Friendship};
pub use group::{Group, GroupStatus};
pub use group_member::{GroupMember, SyncCandidate};
pub use order::{EcpayPayment, Order, OrderStatus, Product, TicketType};
pub use sync_attempt::{FriendSyncAttempt, SyncStatus};
pub use user::{LinkedUser, User};
