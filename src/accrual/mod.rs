//! Accrual Oracle
//!
//! The accrual service decides, asynchronously, how many points an order
//! earns. We only ever poll it: one query per order number, answered with a
//! [`Verdict`] or an [`OracleError`].
//!
//! Implementations:
//! - [`HttpAccrualClient`]: `GET <base>/api/orders/{number}`
//! - [`ScriptedOracle`]: in-process verdict table for tests and local runs

pub mod client;
pub mod scripted;

pub use client::HttpAccrualClient;
pub use scripted::ScriptedOracle;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::core_types::Points;

// ============================================================================
// Verdict
// ============================================================================

/// Oracle decision for one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Known to the oracle, scoring not started
    Registered,
    Processing,
    /// Oracle refuses to score the order (terminal)
    Invalid,
    /// Scoring done (terminal)
    Processed { accrual: Points },
}

/// Wire status values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl FromStr for OracleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(OracleStatus::Registered),
            "PROCESSING" => Ok(OracleStatus::Processing),
            "INVALID" => Ok(OracleStatus::Invalid),
            "PROCESSED" => Ok(OracleStatus::Processed),
            _ => Err(format!("Invalid oracle status: {}", s)),
        }
    }
}

/// Wire body of a 200 answer
#[derive(Debug, Clone, Deserialize)]
pub struct OracleResponse {
    pub order: String,
    /// Kept raw so unknown values become `Malformed`, not a decode failure
    pub status: String,
    #[serde(default)]
    pub accrual: Option<Points>,
}

impl OracleResponse {
    /// Validate the body against the queried number and turn it into a verdict
    pub fn into_verdict(self, queried: &str) -> Result<Verdict, OracleError> {
        if self.order != queried {
            return Err(OracleError::Malformed(format!(
                "order echo mismatch: asked {}, got {}",
                queried, self.order
            )));
        }

        let status: OracleStatus = self
            .status
            .parse()
            .map_err(|_| OracleError::Malformed(format!("unknown status {}", self.status)))?;

        match status {
            OracleStatus::Registered => Ok(Verdict::Registered),
            OracleStatus::Processing => Ok(Verdict::Processing),
            OracleStatus::Invalid => Ok(Verdict::Invalid),
            OracleStatus::Processed => match self.accrual {
                Some(accrual) if accrual < Decimal::ZERO => {
                    Err(OracleError::Malformed(format!("negative accrual {}", accrual)))
                }
                Some(accrual) => Ok(Verdict::Processed { accrual }),
                None => Err(OracleError::Malformed(
                    "PROCESSED without accrual".to_string(),
                )),
            },
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle rate limit, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Order not registered at oracle")]
    NotRegistered,

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    #[error("Unexpected oracle HTTP status: {0}")]
    UnexpectedStatus(u16),
}

impl OracleError {
    /// Transient errors are retried on the next tick; fatal ones are logged
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OracleError::RateLimited { .. } | OracleError::NotRegistered | OracleError::Unavailable(_)
        )
    }
}

// ============================================================================
// Oracle trait
// ============================================================================

#[async_trait]
pub trait AccrualOracle: Send + Sync {
    /// Query the oracle about one order number. No side effects.
    async fn query(&self, order_number: &str) -> Result<Verdict, OracleError>;
}
