//! Withdrawal Guard
//!
//! Spends points: validates the request, then checks the balance and appends
//! the debit as one atomic repository operation.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core_types::{Points, UserId};
use crate::order::{OrderNumber, ValidationError};
use crate::repository::{DebitOutcome, LoyaltyRepository, RepositoryError};

/// Result of a withdrawal request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Debit appended; `balance` is what remains
    Ok { balance: Points },
    InsufficientFunds { balance: Points },
    InvalidOrderLabel(ValidationError),
    /// Zero or negative amount
    InvalidAmount,
}

pub struct WithdrawalGuard {
    repo: Arc<dyn LoyaltyRepository>,
}

impl WithdrawalGuard {
    pub fn new(repo: Arc<dyn LoyaltyRepository>) -> Self {
        Self { repo }
    }

    pub async fn withdraw(
        &self,
        owner: UserId,
        label: &str,
        amount: Points,
    ) -> Result<WithdrawOutcome, RepositoryError> {
        if amount <= Decimal::ZERO {
            return Ok(WithdrawOutcome::InvalidAmount);
        }

        let label = match OrderNumber::parse(label) {
            Ok(l) => l,
            Err(e) => return Ok(WithdrawOutcome::InvalidOrderLabel(e)),
        };

        let outcome = match self.repo.debit_if_covered(owner, &label, amount).await? {
            DebitOutcome::Debited { balance_after } => {
                info!(user_id = owner, order = %label, amount = %amount, balance = %balance_after, "Withdrawal recorded");
                WithdrawOutcome::Ok {
                    balance: balance_after,
                }
            }
            DebitOutcome::InsufficientFunds { balance } => {
                warn!(user_id = owner, order = %label, amount = %amount, balance = %balance, "Withdrawal rejected: insufficient funds");
                WithdrawOutcome::InsufficientFunds { balance }
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn funded(amount: &str) -> (Arc<MemoryRepository>, WithdrawalGuard) {
        let repo = Arc::new(MemoryRepository::new());
        repo.insert_order_if_absent(&OrderNumber::parse("12345678903").unwrap(), 1)
            .await
            .unwrap();
        repo.credit_processed("12345678903", dec(amount)).await.unwrap();
        let guard = WithdrawalGuard::new(repo.clone());
        (repo, guard)
    }

    #[tokio::test]
    async fn test_withdraw_within_balance() {
        let (repo, guard) = funded("500").await;

        assert_eq!(
            guard.withdraw(1, "2377225624", dec("200")).await.unwrap(),
            WithdrawOutcome::Ok {
                balance: dec("300")
            }
        );
        let summary = repo.balance(1).await.unwrap();
        assert_eq!(summary.current, dec("300"));
        assert_eq!(summary.withdrawn, dec("200"));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_leaves_balance() {
        let (repo, guard) = funded("300").await;

        assert_eq!(
            guard.withdraw(1, "2377225624", dec("400")).await.unwrap(),
            WithdrawOutcome::InsufficientFunds {
                balance: dec("300")
            }
        );
        assert_eq!(repo.balance(1).await.unwrap().current, dec("300"));
        assert!(repo.withdrawals(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_exact_balance() {
        let (_repo, guard) = funded("42.5").await;
        assert_eq!(
            guard.withdraw(1, "2377225624", dec("42.5")).await.unwrap(),
            WithdrawOutcome::Ok {
                balance: Decimal::ZERO
            }
        );
    }

    #[tokio::test]
    async fn test_withdraw_rejects_bad_input_first() {
        let (repo, guard) = funded("100").await;

        assert_eq!(
            guard.withdraw(1, "2377225624", Decimal::ZERO).await.unwrap(),
            WithdrawOutcome::InvalidAmount
        );
        assert_eq!(
            guard.withdraw(1, "2377225624", dec("-5")).await.unwrap(),
            WithdrawOutcome::InvalidAmount
        );
        assert!(matches!(
            guard.withdraw(1, "2377225625", dec("5")).await.unwrap(),
            WithdrawOutcome::InvalidOrderLabel(ValidationError::ChecksumMismatch(_))
        ));
        assert_eq!(repo.balance(1).await.unwrap().current, dec("100"));
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let (repo, guard) = funded("100").await;
        let guard = Arc::new(guard);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                guard.withdraw(1, "2377225624", dec("15")).await.unwrap()
            }));
        }

        let mut ok = 0;
        for h in handles {
            if matches!(h.await.unwrap(), WithdrawOutcome::Ok { .. }) {
                ok += 1;
            }
        }
        assert_eq!(ok, 6);
        assert_eq!(repo.balance(1).await.unwrap().current, dec("10"));
    }
}
