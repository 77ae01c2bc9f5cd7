//! Order upload and history handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{caller, storage_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResponse, OrderData, api_error, error_codes};
use crate::intake::SubmitOutcome;
use crate::user_auth::Claims;

/// Upload an order number
///
/// POST /api/user/orders (body: order number as plain text)
#[utoipa::path(
    post,
    path = "/api/user/orders",
    request_body(content = String, content_type = "text/plain", description = "Order number"),
    responses(
        (status = 202, description = "New order accepted for processing"),
        (status = 200, description = "Order already uploaded by this user"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Order uploaded by another user"),
        (status = 422, description = "Invalid order number")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn upload_order(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let user_id = caller(&claims)?;

    match state
        .intake
        .submit(user_id, &body)
        .await
        .map_err(storage_error)?
    {
        SubmitOutcome::Accepted => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::<()>::message("accepted")),
        )),
        SubmitOutcome::AlreadyOwnedByCaller => Ok((
            StatusCode::OK,
            Json(ApiResponse::<()>::message("already uploaded")),
        )),
        SubmitOutcome::OwnedByOther => Err(api_error(
            StatusCode::CONFLICT,
            error_codes::ORDER_OWNED_BY_OTHER,
            "Order already uploaded by another user",
        )),
        SubmitOutcome::Invalid(e) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            error_codes::INVALID_ORDER_NUMBER,
            e.to_string(),
        )),
    }
}

/// List the caller's orders
///
/// GET /api/user/orders
#[utoipa::path(
    get,
    path = "/api/user/orders",
    responses(
        (status = 200, description = "Orders with status and accrual", body = ApiResponse<Vec<OrderData>>),
        (status = 204, description = "No orders uploaded"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let user_id = caller(&claims)?;

    let orders = state.intake.history(user_id).await.map_err(storage_error)?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let data: Vec<OrderData> = orders.into_iter().map(OrderData::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::success(data))).into_response())
}
