//! Order Intake
//!
//! Validates uploaded order numbers and records them as NEW. Intake never
//! talks to the oracle; the reconciliation worker picks new orders up.

use std::sync::Arc;
use tracing::{debug, info};

use crate::core_types::UserId;
use crate::order::{HistorySort, Order, OrderNumber, ValidationError};
use crate::repository::{InsertOutcome, LoyaltyRepository, RepositoryError};

/// Result of an upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New order recorded as NEW
    Accepted,
    /// Caller already uploaded this number; nothing changed
    AlreadyOwnedByCaller,
    /// Another user owns this number
    OwnedByOther,
    Invalid(ValidationError),
}

pub struct OrderIntake {
    repo: Arc<dyn LoyaltyRepository>,
    history_sort: HistorySort,
}

impl OrderIntake {
    pub fn new(repo: Arc<dyn LoyaltyRepository>, history_sort: HistorySort) -> Self {
        Self { repo, history_sort }
    }

    pub async fn submit(&self, owner: UserId, text: &str) -> Result<SubmitOutcome, RepositoryError> {
        let number = match OrderNumber::parse(text) {
            Ok(n) => n,
            Err(e) => {
                debug!(user_id = owner, error = %e, "Rejected order number");
                return Ok(SubmitOutcome::Invalid(e));
            }
        };

        let outcome = match self.repo.insert_order_if_absent(&number, owner).await? {
            InsertOutcome::Inserted => {
                info!(user_id = owner, order = %number, "Order accepted");
                SubmitOutcome::Accepted
            }
            InsertOutcome::Exists { owner: existing } if existing == owner => {
                SubmitOutcome::AlreadyOwnedByCaller
            }
            InsertOutcome::Exists { owner: existing } => {
                info!(user_id = owner, owner = existing, order = %number, "Order owned by another user");
                SubmitOutcome::OwnedByOther
            }
        };

        Ok(outcome)
    }

    /// The owner's orders in the configured upload-time order
    pub async fn history(&self, owner: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.repo.orders_for_owner(owner, self.history_sort).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::repository::MemoryRepository;

    fn intake(sort: HistorySort) -> OrderIntake {
        OrderIntake::new(Arc::new(MemoryRepository::new()), sort)
    }

    #[tokio::test]
    async fn test_submit_classifies_by_owner() {
        let intake = intake(HistorySort::OldestFirst);

        assert_eq!(
            intake.submit(1, "79927398713").await.unwrap(),
            SubmitOutcome::Accepted
        );
        assert_eq!(
            intake.submit(1, "79927398713").await.unwrap(),
            SubmitOutcome::AlreadyOwnedByCaller
        );
        assert_eq!(
            intake.submit(2, "79927398713").await.unwrap(),
            SubmitOutcome::OwnedByOther
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid() {
        let intake = intake(HistorySort::OldestFirst);

        assert_eq!(
            intake.submit(1, "79927398710").await.unwrap(),
            SubmitOutcome::Invalid(ValidationError::ChecksumMismatch("79927398710".into()))
        );
        assert!(matches!(
            intake.submit(1, "").await.unwrap(),
            SubmitOutcome::Invalid(ValidationError::Empty)
        ));
        assert!(matches!(
            intake.submit(1, "abc").await.unwrap(),
            SubmitOutcome::Invalid(ValidationError::NonDigit(_))
        ));
        assert!(intake.history(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_trims_input() {
        let intake = intake(HistorySort::OldestFirst);
        assert_eq!(
            intake.submit(1, " 12345678903\n").await.unwrap(),
            SubmitOutcome::Accepted
        );
        let history = intake.history(1).await.unwrap();
        assert_eq!(history[0].number, "12345678903");
        assert_eq!(history[0].status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_history_sort_direction() {
        let intake = intake(HistorySort::NewestFirst);
        intake.submit(1, "12345678903").await.unwrap();
        intake.submit(1, "79927398713").await.unwrap();
        intake.submit(2, "2377225624").await.unwrap();

        let numbers: Vec<String> = intake
            .history(1)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.number)
            .collect();
        assert_eq!(numbers, vec!["79927398713", "12345678903"]);
    }

    #[tokio::test]
    async fn test_racing_uploads_one_winner() {
        let intake = Arc::new(intake(HistorySort::OldestFirst));
        let mut handles = Vec::new();
        for owner in 1..=8 {
            let intake = intake.clone();
            handles.push(tokio::spawn(async move {
                intake.submit(owner, "4561261212345467").await.unwrap()
            }));
        }

        let mut accepted = 0;
        for h in handles {
            match h.await.unwrap() {
                SubmitOutcome::Accepted => accepted += 1,
                SubmitOutcome::OwnedByOther => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(accepted, 1);
    }
}
