//! HTTP handlers
//!
//! Auth handlers live in [`crate::user_auth::handlers`].

pub mod balance;
pub mod health;
pub mod orders;

pub use balance::{get_balance, list_withdrawals, withdraw};
pub use health::{HealthResponse, health_check};
pub use orders::{list_orders, upload_order};

use axum::http::StatusCode;

use super::types::{ApiError, api_error, error_codes};
use crate::core_types::UserId;
use crate::repository::RepositoryError;
use crate::user_auth::Claims;

/// User id from the JWT injected by the auth middleware
pub(crate) fn caller(claims: &Claims) -> Result<UserId, ApiError> {
    claims.user_id().map_err(|_| {
        api_error(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid token subject",
        )
    })
}

pub(crate) fn storage_error(e: RepositoryError) -> ApiError {
    tracing::error!("Storage error: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        "Internal server error",
    )
}
