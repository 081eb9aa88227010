use super::parse_json;
use crate::auth::require_service_role;
use crate::error::{AppError, AppResult};
use crate::repositories::GroupSchedule;
use crate::services::ConfirmOutcome;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const FRIENDS_DETAILS: &str = "此群組中有臉書好友，無法確認分組。請調整成員後再試。";

#[derive(Debug, Deserialize)]
struct ConfirmGroupRequest {
    group_id: Option<Uuid>,
    venue_id: Option<Uuid>,
    chat_open_at: Option<DateTime<Utc>>,
    goal_close_at: Option<DateTime<Utc>>,
    feedback_sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GroupIdRequest {
    group_id: Option<Uuid>,
}

fn require_group_id(group_id: Option<Uuid>) -> AppResult<Uuid> {
    group_id.ok_or_else(|| AppError::Validation("Missing group_id".to_string()))
}

/// `POST /confirm-group`
pub(super) async fn confirm_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    require_service_role(&headers, &state.config.supabase.service_role_key)?;

    let request: ConfirmGroupRequest = parse_json(&body)?;
    let group_id = require_group_id(request.group_id)?;
    let schedule = GroupSchedule {
        venue_id: request.venue_id,
        chat_open_at: request.chat_open_at,
        goal_close_at: request.goal_close_at,
        feedback_sent_at: request.feedback_sent_at,
    };

    let outcome = state.group_confirmation.confirm(group_id, &schedule).await?;
    let sync_results = outcome.sync();

    let response = match outcome {
        ConfirmOutcome::Confirmed { .. } => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "群組確認成功",
                "group_id": group_id,
                "sync_results": sync_results,
            })),
        ),
        ConfirmOutcome::ContainsFriends { message, .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "group_contains_facebook_friends",
                "message": message,
                "details": FRIENDS_DETAILS,
                "sync_results": sync_results,
            })),
        ),
        ConfirmOutcome::Rejected { message, .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "failed_to_confirm_group",
                "message": message,
                "sync_results": sync_results,
            })),
        ),
    };

    Ok(response.into_response())
}

/// `POST /unlock-group`
pub(super) async fn unlock_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    require_service_role(&headers, &state.config.supabase.service_role_key)?;

    let request: GroupIdRequest = parse_json(&body)?;
    let group = state
        .group_confirmation
        .unlock(require_group_id(request.group_id)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "group_id": group.id,
        "status": group.status,
    })))
}

/// `POST /delete-group`
pub(super) async fn delete_group(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    require_service_role(&headers, &state.config.supabase.service_role_key)?;

    let request: GroupIdRequest = parse_json(&body)?;
    let group_id = require_group_id(request.group_id)?;
    state.group_confirmation.delete(group_id).await?;

    Ok(Json(json!({ "success": true, "group_id": group_id })))
}

/// `POST /run-auto-grouping`, called by cron
pub(super) async fn run_auto_grouping(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    require_service_role(&headers, &state.config.supabase.service_role_key)?;

    let report = state.auto_grouping.run(Utc::now()).await?;

    if report.events_processed == 0 {
        return Ok(Json(json!({
            "success": true,
            "message": format!("No events found for {}", report.target_date),
            "events_processed": 0,
        })));
    }

    Ok(Json(serde_json::to_value(report)?))
}
