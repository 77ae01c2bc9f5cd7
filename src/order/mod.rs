//! Orders: validation, lifecycle and records

pub mod models;
pub mod state;
pub mod validation;

pub use models::{BalanceSummary, EntryKind, HistorySort, LedgerEntry, Order};
pub use state::OrderStatus;
pub use validation::{OrderNumber, ValidationError, luhn_valid};
