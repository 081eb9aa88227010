pub mod auto_grouping;
pub mod data_deletion;
pub mod friend_sync;
pub mod group_confirmation;
pub mod payment_service;

pub use auto_grouping::{target_date, AutoGroupingReport, AutoGroupingScheduler, AutoGroupingService, GroupingResult};
pub use data_deletion::{DataDeletionService, DeletionReceipt, StatusPage};
pub use friend_sync::{FriendSyncService, SyncError, SyncOutcome, SyncSummary};
pub use group_confirmation::{ConfirmOutcome, GroupConfirmationService};
pub use payment_service::{CreatedOrder, PaymentService, ReturnAck};
