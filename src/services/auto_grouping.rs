use crate::error::{AppError, AppResult, RepositoryError};
use crate::repositories::EventRepository;
use crate::services::friend_sync::FriendSyncService;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::time;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Hours ahead of UTC used to pick the calendar day (Taiwan, no DST)
const LOCAL_OFFSET_HOURS: i64 = 8;

/// Events are grouped this many days ahead
const DAYS_AHEAD: i64 = 2;

/// Date whose events a run started at `now` groups
pub fn target_date(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(LOCAL_OFFSET_HOURS)).date_naive() + Duration::days(DAYS_AHEAD)
}

/// Per-event entry of a run report
#[derive(Debug, Clone, Serialize)]
pub struct GroupingResult {
    pub event_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_created: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GroupingResult {
    fn failed(event_id: Uuid, error: String) -> Self {
        Self {
            event_id,
            success: false,
            groups_created: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoGroupingReport {
    pub success: bool,
    pub target_date: NaiveDate,
    pub events_processed: usize,
    pub users_synced: usize,
    pub sync_errors: usize,
    pub grouping_results: Vec<GroupingResult>,
}

/// Syncs registrants' friends and seeds groups for events two days out
pub struct AutoGroupingService {
    event_repo: Arc<EventRepository>,
    friend_sync: Arc<FriendSyncService>,
}

impl AutoGroupingService {
    pub fn new(event_repo: Arc<EventRepository>, friend_sync: Arc<FriendSyncService>) -> Self {
        Self {
            event_repo,
            friend_sync,
        }
    }

    /// Run the batch for the date derived from `now`.
    ///
    /// Events are processed sequentially; a failing event is reported in
    /// `grouping_results` and never stops the ones after it.
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<AutoGroupingReport> {
        let date = target_date(now);
        info!("Auto-grouping events on {}", date);

        let events = self.event_repo.find_scheduled_on(date).await.map_err(|e| {
            error!("Failed to fetch events for {}: {}", date, e);
            AppError::Internal("Failed to fetch events".to_string())
        })?;

        let mut report = AutoGroupingReport {
            success: true,
            target_date: date,
            events_processed: events.len(),
            users_synced: 0,
            sync_errors: 0,
            grouping_results: Vec::with_capacity(events.len()),
        };

        for event in &events {
            let registrants = match self.event_repo.find_linked_registrants(event.id).await {
                Ok(registrants) => registrants,
                Err(e) => {
                    warn!("Failed to load registrants of event {}: {}", event.id, e);
                    report
                        .grouping_results
                        .push(GroupingResult::failed(event.id, e.to_string()));
                    continue;
                }
            };

            let sync = self.friend_sync.sync_candidates(&registrants).await;
            report.users_synced += sync.users_synced;
            report.sync_errors += sync.sync_errors;

            let result = match self.event_repo.auto_seed_groups(event.id).await {
                Ok(created) => {
                    info!("Event {}: created {} groups", event.id, created);
                    GroupingResult {
                        event_id: event.id,
                        success: true,
                        groups_created: Some(created),
                        error: None,
                    }
                }
                Err(e) => {
                    let message = RepositoryError::from(e).message();
                    warn!("Grouping failed for event {}: {}", event.id, message);
                    GroupingResult::failed(event.id, message)
                }
            };
            report.grouping_results.push(result);
        }

        info!(
            "Auto-grouping for {} done: {} events, {} users synced, {} sync errors",
            date, report.events_processed, report.users_synced, report.sync_errors
        );

        Ok(report)
    }
}

/// Runs the batch periodically inside the service process
pub struct AutoGroupingScheduler {
    service: Arc<AutoGroupingService>,
    interval: std::time::Duration,
}

impl AutoGroupingScheduler {
    pub fn new(service: Arc<AutoGroupingService>, interval: std::time::Duration) -> Self {
        Self { service, interval }
    }

    /// Loop forever; errors are logged and the next tick runs normally
    pub async fn start(self) {
        let mut interval = ticker(self.interval);
        info!("Auto-grouping scheduler started, running every {:?}", self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.service.run(Utc::now()).await {
                error!("Scheduled auto-grouping failed: {}", e);
            }
        }
    }
}

/// Interval whose missed ticks are delayed, never fired back to back
fn ticker(period: std::time::Duration) -> time::Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    interval
}
