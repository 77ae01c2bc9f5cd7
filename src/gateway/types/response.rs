//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - Response DTOs for orders, balance and withdrawals

use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::order::{BalanceSummary, LedgerEntry, Order, OrderStatus};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Success without payload, with a custom message
    pub fn message(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code: 0,
            msg: msg.into(),
            data: None,
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub fn api_error(status: StatusCode, code: i32, msg: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::<()>::error(code, msg)))
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Uploaded order as shown to its owner
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderData {
    #[schema(example = "12345678903")]
    pub number: String,
    pub status: OrderStatus,
    /// Present only for PROCESSED orders
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    #[schema(value_type = Option<f64>, example = 500)]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderData {
    fn from(o: Order) -> Self {
        Self {
            number: o.number,
            status: o.status,
            accrual: o.accrual,
            uploaded_at: o.uploaded_at,
        }
    }
}

/// Current balance and withdrawn total
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceData {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 500.5)]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 42)]
    pub withdrawn: Decimal,
}

impl From<BalanceSummary> for BalanceData {
    fn from(s: BalanceSummary) -> Self {
        Self {
            current: s.current,
            withdrawn: s.withdrawn,
        }
    }
}

/// One recorded withdrawal
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalData {
    /// Order label supplied with the withdrawal
    #[schema(example = "2377225624")]
    pub order: String,
    /// Points spent, positive
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 500)]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<LedgerEntry> for WithdrawalData {
    fn from(e: LedgerEntry) -> Self {
        Self {
            order: e.order_number,
            sum: e.amount.abs(),
            processed_at: e.recorded_at,
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_ORDER_NUMBER: i32 = 1003;
    pub const INVALID_AMOUNT: i32 = 1004;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;

    // Conflict errors (3xxx)
    pub const LOGIN_TAKEN: i32 = 3001;
    pub const ORDER_OWNED_BY_OTHER: i32 = 3002;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}
