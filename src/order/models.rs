//! Order and ledger records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::state::OrderStatus;
use crate::core_types::{EntryId, Points, UserId};

/// Uploaded purchase order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub number: String,
    pub owner: UserId,
    pub status: OrderStatus,
    /// Set only on the transition into PROCESSED
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    pub fn new(number: impl Into<String>, owner: UserId) -> Self {
        Self {
            number: number.into(),
            owner,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
        }
    }
}

/// Ledger entry kind, stored as SMALLINT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum EntryKind {
    Accrual = 1,
    Withdrawal = 2,
}

impl EntryKind {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryKind::Accrual),
            2 => Some(EntryKind::Withdrawal),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Accrual => write!(f, "accrual"),
            EntryKind::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// Append-only signed points movement
///
/// Positive amounts are accruals, negative amounts are withdrawals.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub owner: UserId,
    pub order_number: String,
    pub amount: Points,
    pub kind: EntryKind,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregated view of an owner's ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    /// Sum of all entries
    pub current: Points,
    /// Absolute sum of negative entries
    pub withdrawn: Points,
}

impl BalanceSummary {
    /// Fold a set of entries into a summary
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries
            .into_iter()
            .fold(BalanceSummary::default(), |mut acc, e| {
                acc.current += e.amount;
                if e.amount < Decimal::ZERO {
                    acc.withdrawn += -e.amount;
                }
                acc
            })
    }
}

/// Order history sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySort {
    #[default]
    OldestFirst,
    NewestFirst,
}

impl FromStr for HistorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oldest_first" | "oldest" | "asc" => Ok(HistorySort::OldestFirst),
            "newest_first" | "newest" | "desc" => Ok(HistorySort::NewestFirst),
            _ => Err(format!("Invalid history sort: {}", s)),
        }
    }
}
