use super::form_fields;
use crate::error::{AppError, AppResult};
use crate::services::DeletionReceipt;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use std::collections::HashMap;
use std::sync::Arc;

/// `POST /facebook-data-deletion`, called by Facebook when a user removes the app
pub(super) async fn data_deletion(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<DeletionReceipt>> {
    let fields = form_fields(&body);
    let signed_request = fields
        .get("signed_request")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Missing signed_request".to_string()))?;

    Ok(Json(state.data_deletion.handle_callback(signed_request).await?))
}

/// `GET /facebook-data-deletion-status?code=`
pub(super) async fn data_deletion_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let page = state
        .data_deletion
        .status_page(query.get("code").map(String::as_str))
        .await;
    let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Html(page.html)).into_response()
}
