//! Balance, withdrawal and withdrawal history handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{caller, storage_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{
    ApiError, ApiResponse, BalanceData, WithdrawRequest, WithdrawalData, api_error, error_codes,
};
use crate::user_auth::Claims;
use crate::withdrawal::WithdrawOutcome;

/// Current balance and withdrawn total
///
/// GET /api/user/balance
#[utoipa::path(
    get,
    path = "/api/user/balance",
    responses(
        (status = 200, description = "Balance summary", body = ApiResponse<BalanceData>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<ApiResponse<BalanceData>>), ApiError> {
    let user_id = caller(&claims)?;
    let summary = state.ledger.balance(user_id).await.map_err(storage_error)?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary.into()))))
}

/// Spend points on an order
///
/// POST /api/user/balance/withdraw
#[utoipa::path(
    post,
    path = "/api/user/balance/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = ApiResponse<BalanceData>),
        (status = 400, description = "Malformed body or non-positive amount"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Insufficient funds"),
        (status = 422, description = "Invalid order number")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<BalanceData>>), ApiError> {
    let user_id = caller(&claims)?;
    let Json(req) = body.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e.body_text(),
        )
    })?;

    match state
        .withdrawals
        .withdraw(user_id, &req.order, req.sum.inner())
        .await
        .map_err(storage_error)?
    {
        WithdrawOutcome::Ok { .. } => {
            let summary = state.ledger.balance(user_id).await.map_err(storage_error)?;
            Ok((StatusCode::OK, Json(ApiResponse::success(summary.into()))))
        }
        WithdrawOutcome::InsufficientFunds { balance } => Err(api_error(
            StatusCode::PAYMENT_REQUIRED,
            error_codes::INSUFFICIENT_BALANCE,
            format!("Insufficient funds: balance {}", balance),
        )),
        WithdrawOutcome::InvalidOrderLabel(e) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            error_codes::INVALID_ORDER_NUMBER,
            e.to_string(),
        )),
        WithdrawOutcome::InvalidAmount => Err(api_error(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_AMOUNT,
            "Amount must be positive",
        )),
    }
}

/// Withdrawal history, newest first
///
/// GET /api/user/withdrawals
#[utoipa::path(
    get,
    path = "/api/user/withdrawals",
    responses(
        (status = 200, description = "Withdrawals", body = ApiResponse<Vec<WithdrawalData>>),
        (status = 204, description = "No withdrawals"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let user_id = caller(&claims)?;

    let entries = state.ledger.withdrawals(user_id).await.map_err(storage_error)?;
    if entries.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let data: Vec<WithdrawalData> = entries.into_iter().map(WithdrawalData::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::success(data))).into_response())
}
