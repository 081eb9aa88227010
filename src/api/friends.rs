use super::parse_json;
use crate::error::{AppError, AppResult};
use crate::facebook::GraphError;
use crate::services::SyncError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SyncFriendsRequest {
    access_token: Option<String>,
    #[serde(default)]
    store_token: bool,
}

/// `POST /sync-facebook-friends`: the signed-in user syncs their own friends
pub(super) async fn sync_facebook_friends(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let user = state.auth.authenticate(&headers).await?;

    let request: SyncFriendsRequest = parse_json(&body)?;
    let access_token = request
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Missing access_token".to_string()))?;

    match state
        .friend_sync
        .sync_with_token(user.id, &access_token, request.store_token)
        .await
    {
        Ok(outcome) => Ok(Json(json!({
            "success": true,
            "friends_count": outcome.inserted,
            "total_fb_friends": outcome.total_fb_friends,
            "matched_app_users": outcome.matched_app_users,
            "message": format!("成功同步 {} 位好友", outcome.inserted),
        }))
        .into_response()),
        Err(SyncError::Graph(GraphError::Api { code, message, .. })) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message, "error_code": code })),
        )
            .into_response()),
        Err(SyncError::Graph(e)) => Err(AppError::ExternalService(e.to_string())),
        Err(SyncError::Database(e)) => Err(AppError::Sqlx(e)),
    }
}
