use super::{form_fields, parse_json};
use crate::error::{AppError, AppResult};
use crate::services::CreatedOrder;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    product_id: Option<Uuid>,
}

/// Plain 302 redirect
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn checkout_token(fields: &HashMap<String, String>) -> AppResult<&str> {
    fields
        .get("token")
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Missing token".to_string()))
}

/// `POST /ecpay_create_order`
pub(super) async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<CreatedOrder>> {
    let user = state.auth.authenticate(&headers).await?;

    let request: CreateOrderRequest = parse_json(&body)?;
    let product_id = request
        .product_id
        .ok_or_else(|| AppError::Validation("Missing product_id".to_string()))?;

    Ok(Json(state.payments.create_order(user.id, product_id).await?))
}

/// `GET /ecpay_pay?token=`: bounce to the pay site, which posts the token back
pub(super) async fn pay_redirect(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let token = checkout_token(&query)?;
    Ok(found(state.payments.checkout_redirect_url(token)))
}

/// `POST /ecpay_pay`: render the auto-submitting gateway form
pub(super) async fn pay_form(State(state): State<Arc<AppState>>, body: Bytes) -> AppResult<Response> {
    let fields = form_fields(&body);
    let token = checkout_token(&fields)?;

    let html = state.payments.checkout_page(token, Utc::now()).await?;
    Ok(([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response())
}

/// `POST /ecpay_return`: server-to-server payment notification
pub(super) async fn gateway_return(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let fields = form_fields(&body);
    let ack = state.payments.handle_return(&fields).await;
    (StatusCode::OK, ack.as_str()).into_response()
}

/// `POST /ecpay_client_result`: the shopper's browser after payment
pub(super) async fn client_result(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let fields = form_fields(&body);
    found(state.payments.client_result_url(&fields))
}
