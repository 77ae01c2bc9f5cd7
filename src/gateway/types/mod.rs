//! Gateway types module
//!
//! ## Input Types
//! - [`PointsInput`]: Format-validated points amount
//! - [`WithdrawRequest`]: Withdrawal body
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`OrderData`], [`BalanceData`], [`WithdrawalData`]

pub mod money;
pub mod response;

pub use money::PointsInput;
pub use response::{
    ApiError, ApiResponse, BalanceData, OrderData, WithdrawalData, api_error, error_codes,
};

use serde::Deserialize;
use utoipa::ToSchema;

/// Withdrawal request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Order label the points are spent on (Luhn-valid)
    #[schema(example = "2377225624")]
    pub order: String,
    #[schema(value_type = f64, example = 751)]
    pub sum: PointsInput,
}
