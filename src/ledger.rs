//! Ledger read side
//!
//! Balance and withdrawn total are derived from the append-only entry log;
//! nothing here writes.

use std::sync::Arc;

use crate::core_types::UserId;
use crate::order::{BalanceSummary, LedgerEntry};
use crate::repository::{LoyaltyRepository, RepositoryError};

pub struct LedgerService {
    repo: Arc<dyn LoyaltyRepository>,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LoyaltyRepository>) -> Self {
        Self { repo }
    }

    pub async fn balance(&self, owner: UserId) -> Result<BalanceSummary, RepositoryError> {
        self.repo.balance(owner).await
    }

    /// Withdrawal entries, newest first. Amounts are negative as stored.
    pub async fn withdrawals(&self, owner: UserId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        self.repo.withdrawals(owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{EntryKind, OrderNumber};
    use crate::repository::MemoryRepository;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_balance_matches_entry_sum() {
        let repo = Arc::new(MemoryRepository::new());
        let ledger = LedgerService::new(repo.clone());

        assert_eq!(ledger.balance(1).await.unwrap(), BalanceSummary::default());

        for (number, amount) in [("12345678903", 500), ("79927398713", 20)] {
            repo.insert_order_if_absent(&OrderNumber::parse(number).unwrap(), 1)
                .await
                .unwrap();
            repo.credit_processed(number, Decimal::new(amount, 0))
                .await
                .unwrap();
        }
        repo.debit_if_covered(1, &OrderNumber::parse("2377225624").unwrap(), Decimal::new(120, 0))
            .await
            .unwrap();

        let entries = repo.ledger_entries(1).await.unwrap();
        let summary = ledger.balance(1).await.unwrap();
        assert_eq!(summary, BalanceSummary::from_entries(&entries));
        assert_eq!(summary.current, Decimal::new(400, 0));
        assert_eq!(summary.withdrawn, Decimal::new(120, 0));

        let withdrawals = ledger.withdrawals(1).await.unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].kind, EntryKind::Withdrawal);
        assert_eq!(withdrawals[0].amount, Decimal::new(-120, 0));
    }
}
