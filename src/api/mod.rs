//! HTTP surface. Every route lives under `/functions/v1`.

mod facebook;
mod friends;
mod groups;
mod payments;

use crate::error::{AppError, AppResult};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const FUNCTIONS_PREFIX: &str = "/functions/v1";

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ]);

    let functions = Router::new()
        .route("/sync-facebook-friends", post(friends::sync_facebook_friends))
        .route("/confirm-group", post(groups::confirm_group))
        .route("/unlock-group", post(groups::unlock_group))
        .route("/delete-group", post(groups::delete_group))
        .route("/run-auto-grouping", post(groups::run_auto_grouping))
        .route("/ecpay_create_order", post(payments::create_order))
        .route("/ecpay_pay", get(payments::pay_redirect).post(payments::pay_form))
        .route("/ecpay_return", post(payments::gateway_return))
        .route("/ecpay_client_result", post(payments::client_result))
        .route("/facebook-data-deletion", post(facebook::data_deletion))
        .route("/facebook-data-deletion-status", get(facebook::data_deletion_status))
        .route("/health", get(health));

    Router::new()
        .nest(FUNCTIONS_PREFIX, functions)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now();
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": timestamp })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": timestamp })),
            )
        }
    }
}

/// Decode a JSON body after authentication has passed
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

/// Decode an `application/x-www-form-urlencoded` body; later duplicates win
fn form_fields(body: &Bytes) -> HashMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}
