//! Loyalty Repository
//!
//! Storage seam for users, orders and the points ledger.
//!
//! # Atomicity Contract
//!
//! Every method is one atomic unit against the store. In particular:
//!
//! 1. **Insert-if-absent**: the existence check and the insert of an order are
//!    a single operation; two racing inserts of the same number produce one row.
//! 2. **Credit**: marking an order PROCESSED and appending its accrual entry
//!    happen together or not at all, and only if the order is not terminal.
//! 3. **Debit**: reading an owner's balance and appending a withdrawal are
//!    serialized per owner.
//!
//! # Implementations
//! - [`PgRepository`]: PostgreSQL (transactions + row locks)
//! - [`MemoryRepository`]: single mutex over in-process state

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core_types::{Points, UserId};
use crate::order::{BalanceSummary, HistorySort, LedgerEntry, Order, OrderNumber, OrderStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Login already taken: {0}")]
    LoginTaken(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Invalid transition request: {0}")]
    InvalidTransition(String),
}

/// Registered user as stored
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Result of an atomic insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Row already present; carries its owner
    Exists { owner: UserId },
}

/// Result of a conditional status move (non-crediting targets only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated { from: OrderStatus },
    /// Current state was not a predecessor of the target; nothing written
    Unchanged { current: OrderStatus },
}

/// Result of the atomic mark-processed-and-credit unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    Credited { owner: UserId, from: OrderStatus },
    /// Order was already terminal; no entry appended
    AlreadyTerminal { current: OrderStatus },
}

/// Result of the atomic check-balance-and-debit unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Debited { balance_after: Points },
    InsufficientFunds { balance: Points },
}

#[async_trait]
pub trait LoyaltyRepository: Send + Sync {
    // === Users ===

    /// Create a user; `LoginTaken` if the login exists
    async fn create_user(&self, login: &str, password_hash: &str)
    -> Result<UserId, RepositoryError>;

    async fn find_user(&self, login: &str) -> Result<Option<UserRecord>, RepositoryError>;

    // === Orders ===

    /// Insert a NEW order unless the number is already known
    async fn insert_order_if_absent(
        &self,
        number: &OrderNumber,
        owner: UserId,
    ) -> Result<InsertOutcome, RepositoryError>;

    async fn get_order(&self, number: &str) -> Result<Option<Order>, RepositoryError>;

    /// Non-terminal order numbers, oldest upload first
    async fn pending_orders(&self, limit: usize) -> Result<Vec<String>, RepositoryError>;

    async fn orders_for_owner(
        &self,
        owner: UserId,
        sort: HistorySort,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Move an order to `to` only if its current state is a predecessor.
    ///
    /// `to` must not be PROCESSED; crediting goes through [`Self::credit_processed`].
    async fn advance_status(
        &self,
        number: &str,
        to: OrderStatus,
    ) -> Result<StatusUpdate, RepositoryError>;

    /// Mark PROCESSED with `accrual` and append `+accrual` for the owner, atomically
    async fn credit_processed(
        &self,
        number: &str,
        accrual: Points,
    ) -> Result<CreditOutcome, RepositoryError>;

    // === Ledger ===

    async fn balance(&self, owner: UserId) -> Result<BalanceSummary, RepositoryError>;

    /// Append `-amount` labeled `label` if the owner's balance covers it
    async fn debit_if_covered(
        &self,
        owner: UserId,
        label: &OrderNumber,
        amount: Points,
    ) -> Result<DebitOutcome, RepositoryError>;

    /// All entries for an owner, oldest first
    async fn ledger_entries(&self, owner: UserId) -> Result<Vec<LedgerEntry>, RepositoryError>;

    /// Withdrawal entries for an owner, newest first
    async fn withdrawals(&self, owner: UserId) -> Result<Vec<LedgerEntry>, RepositoryError>;
}

pub(crate) fn reject_crediting_target(to: OrderStatus) -> Result<(), RepositoryError> {
    if to == OrderStatus::Processed || to == OrderStatus::New {
        return Err(RepositoryError::InvalidTransition(format!(
            "advance_status cannot target {}",
            to
        )));
    }
    Ok(())
}
