//! In-process repository
//!
//! All state lives behind one `tokio::sync::Mutex`; each trait method holds the
//! lock for its whole body, so every call is atomic with respect to every
//! other call. Used when no database URL is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    CreditOutcome, DebitOutcome, InsertOutcome, LoyaltyRepository, RepositoryError, StatusUpdate,
    UserRecord, reject_crediting_target,
};
use crate::core_types::{EntryId, Points, UserId};
use crate::order::{
    BalanceSummary, EntryKind, HistorySort, LedgerEntry, Order, OrderNumber, OrderStatus,
};

#[derive(Default)]
struct State {
    users: Vec<UserRecord>,
    /// Insertion order == upload order
    orders: Vec<Order>,
    order_index: HashMap<String, usize>,
    ledger: Vec<LedgerEntry>,
    next_user_id: UserId,
    next_entry_id: EntryId,
}

impl State {
    fn order_mut(&mut self, number: &str) -> Option<&mut Order> {
        let idx = *self.order_index.get(number)?;
        self.orders.get_mut(idx)
    }

    fn append_entry(
        &mut self,
        owner: UserId,
        order_number: &str,
        amount: Points,
        kind: EntryKind,
    ) -> EntryId {
        self.next_entry_id += 1;
        let entry_id = self.next_entry_id;
        self.ledger.push(LedgerEntry {
            entry_id,
            owner,
            order_number: order_number.to_string(),
            amount,
            kind,
            recorded_at: Utc::now(),
        });
        entry_id
    }

    fn summary(&self, owner: UserId) -> BalanceSummary {
        BalanceSummary::from_entries(self.ledger.iter().filter(|e| e.owner == owner))
    }
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoyaltyRepository for MemoryRepository {
    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.login == login) {
            return Err(RepositoryError::LoginTaken(login.to_string()));
        }

        state.next_user_id += 1;
        let user_id = state.next_user_id;
        state.users.push(UserRecord {
            user_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        });
        Ok(user_id)
    }

    async fn find_user(&self, login: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.login == login).cloned())
    }

    async fn insert_order_if_absent(
        &self,
        number: &OrderNumber,
        owner: UserId,
    ) -> Result<InsertOutcome, RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(&idx) = state.order_index.get(number.as_str()) {
            return Ok(InsertOutcome::Exists {
                owner: state.orders[idx].owner,
            });
        }

        let idx = state.orders.len();
        state.orders.push(Order::new(number.as_str(), owner));
        state.order_index.insert(number.to_string(), idx);
        Ok(InsertOutcome::Inserted)
    }

    async fn get_order(&self, number: &str) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .order_index
            .get(number)
            .map(|&idx| state.orders[idx].clone()))
    }

    async fn pending_orders(&self, limit: usize) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .take(limit)
            .map(|o| o.number.clone())
            .collect())
    }

    async fn orders_for_owner(
        &self,
        owner: UserId,
        sort: HistorySort,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.owner == owner)
            .cloned()
            .collect();
        if sort == HistorySort::NewestFirst {
            orders.reverse();
        }
        Ok(orders)
    }

    async fn advance_status(
        &self,
        number: &str,
        to: OrderStatus,
    ) -> Result<StatusUpdate, RepositoryError> {
        reject_crediting_target(to)?;

        let mut state = self.state.lock().await;
        let order = state
            .order_mut(number)
            .ok_or_else(|| RepositoryError::OrderNotFound(number.to_string()))?;

        if !to.predecessors().contains(&order.status) {
            return Ok(StatusUpdate::Unchanged {
                current: order.status,
            });
        }

        let from = order.status;
        order.status = to;
        Ok(StatusUpdate::Updated { from })
    }

    async fn credit_processed(
        &self,
        number: &str,
        accrual: Points,
    ) -> Result<CreditOutcome, RepositoryError> {
        if accrual < Decimal::ZERO {
            return Err(RepositoryError::InvalidTransition(format!(
                "negative accrual {} for order {}",
                accrual, number
            )));
        }

        let mut state = self.state.lock().await;
        let order = state
            .order_mut(number)
            .ok_or_else(|| RepositoryError::OrderNotFound(number.to_string()))?;

        if order.status.is_terminal() {
            return Ok(CreditOutcome::AlreadyTerminal {
                current: order.status,
            });
        }

        let from = order.status;
        let owner = order.owner;
        order.status = OrderStatus::Processed;
        order.accrual = Some(accrual);
        state.append_entry(owner, number, accrual, EntryKind::Accrual);

        Ok(CreditOutcome::Credited { owner, from })
    }

    async fn balance(&self, owner: UserId) -> Result<BalanceSummary, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.summary(owner))
    }

    async fn debit_if_covered(
        &self,
        owner: UserId,
        label: &OrderNumber,
        amount: Points,
    ) -> Result<DebitOutcome, RepositoryError> {
        let mut state = self.state.lock().await;
        let balance = state.summary(owner).current;
        if balance < amount {
            return Ok(DebitOutcome::InsufficientFunds { balance });
        }

        state.append_entry(owner, label.as_str(), -amount, EntryKind::Withdrawal);
        Ok(DebitOutcome::Debited {
            balance_after: balance - amount,
        })
    }

    async fn ledger_entries(&self, owner: UserId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.owner == owner)
            .cloned()
            .collect())
    }

    async fn withdrawals(&self, owner: UserId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .iter()
            .rev()
            .filter(|e| e.owner == owner && e.kind == EntryKind::Withdrawal)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> OrderNumber {
        OrderNumber::parse(s).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_insert_order_if_absent() {
        let repo = MemoryRepository::new();

        let first = repo.insert_order_if_absent(&num("79927398713"), 1).await.unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let again = repo.insert_order_if_absent(&num("79927398713"), 2).await.unwrap();
        assert_eq!(again, InsertOutcome::Exists { owner: 1 });

        let order = repo.get_order("79927398713").await.unwrap().unwrap();
        assert_eq!(order.owner, 1);
        assert_eq!(order.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn test_pending_orders_oldest_first_and_limited() {
        let repo = MemoryRepository::new();
        for n in ["12345678903", "79927398713", "2377225624"] {
            repo.insert_order_if_absent(&num(n), 1).await.unwrap();
        }
        repo.advance_status("79927398713", OrderStatus::Invalid)
            .await
            .unwrap();

        let pending = repo.pending_orders(10).await.unwrap();
        assert_eq!(pending, vec!["12345678903", "2377225624"]);

        let limited = repo.pending_orders(1).await.unwrap();
        assert_eq!(limited, vec!["12345678903"]);
    }

    #[tokio::test]
    async fn test_advance_status_only_forward() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 1).await.unwrap();

        let up = repo
            .advance_status("12345678903", OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(up, StatusUpdate::Updated { from: OrderStatus::New });

        // PROCESSING -> PROCESSING is not a move
        let same = repo
            .advance_status("12345678903", OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(same, StatusUpdate::Unchanged { current: OrderStatus::Processing });

        repo.advance_status("12345678903", OrderStatus::Invalid)
            .await
            .unwrap();
        let back = repo
            .advance_status("12345678903", OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(back, StatusUpdate::Unchanged { current: OrderStatus::Invalid });
    }

    #[tokio::test]
    async fn test_advance_status_rejects_processed_target() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 1).await.unwrap();

        let err = repo
            .advance_status("12345678903", OrderStatus::Processed)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_advance_status_unknown_order() {
        let repo = MemoryRepository::new();
        let err = repo
            .advance_status("12345678903", OrderStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_credit_processed_once() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 5).await.unwrap();

        let first = repo.credit_processed("12345678903", dec("500")).await.unwrap();
        assert_eq!(
            first,
            CreditOutcome::Credited {
                owner: 5,
                from: OrderStatus::New
            }
        );

        let second = repo.credit_processed("12345678903", dec("500")).await.unwrap();
        assert_eq!(
            second,
            CreditOutcome::AlreadyTerminal {
                current: OrderStatus::Processed
            }
        );

        let entries = repo.ledger_entries(5).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, dec("500"));
        assert_eq!(entries[0].kind, EntryKind::Accrual);

        let order = repo.get_order("12345678903").await.unwrap().unwrap();
        assert_eq!(order.accrual, Some(dec("500")));
    }

    #[tokio::test]
    async fn test_credit_after_invalid_is_ignored() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 5).await.unwrap();
        repo.advance_status("12345678903", OrderStatus::Invalid)
            .await
            .unwrap();

        let outcome = repo.credit_processed("12345678903", dec("10")).await.unwrap();
        assert_eq!(
            outcome,
            CreditOutcome::AlreadyTerminal {
                current: OrderStatus::Invalid
            }
        );
        assert!(repo.ledger_entries(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debit_if_covered() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 1).await.unwrap();
        repo.credit_processed("12345678903", dec("100")).await.unwrap();

        let ok = repo
            .debit_if_covered(1, &num("2377225624"), dec("60"))
            .await
            .unwrap();
        assert_eq!(ok, DebitOutcome::Debited { balance_after: dec("40") });

        let short = repo
            .debit_if_covered(1, &num("2377225624"), dec("41"))
            .await
            .unwrap();
        assert_eq!(short, DebitOutcome::InsufficientFunds { balance: dec("40") });

        let summary = repo.balance(1).await.unwrap();
        assert_eq!(summary.current, dec("40"));
        assert_eq!(summary.withdrawn, dec("60"));
    }

    #[tokio::test]
    async fn test_withdrawals_newest_first() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 1).await.unwrap();
        repo.credit_processed("12345678903", dec("100")).await.unwrap();
        repo.debit_if_covered(1, &num("2377225624"), dec("10")).await.unwrap();
        repo.debit_if_covered(1, &num("9278923470"), dec("20")).await.unwrap();

        let withdrawals = repo.withdrawals(1).await.unwrap();
        let labels: Vec<&str> = withdrawals.iter().map(|e| e.order_number.as_str()).collect();
        assert_eq!(labels, vec!["9278923470", "2377225624"]);
    }

    #[tokio::test]
    async fn test_users_unique_login() {
        let repo = MemoryRepository::new();
        let id = repo.create_user("alice", "hash").await.unwrap();
        assert_eq!(id, 1);

        let err = repo.create_user("alice", "other").await.unwrap_err();
        assert!(matches!(err, RepositoryError::LoginTaken(_)));

        let user = repo.find_user("alice").await.unwrap().unwrap();
        assert_eq!(user.user_id, id);
        assert!(repo.find_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_orders_for_owner_sorting() {
        let repo = MemoryRepository::new();
        repo.insert_order_if_absent(&num("12345678903"), 1).await.unwrap();
        repo.insert_order_if_absent(&num("79927398713"), 2).await.unwrap();
        repo.insert_order_if_absent(&num("2377225624"), 1).await.unwrap();

        let oldest = repo.orders_for_owner(1, HistorySort::OldestFirst).await.unwrap();
        let numbers: Vec<&str> = oldest.iter().map(|o| o.number.as_str()).collect();
        assert_eq!(numbers, vec!["12345678903", "2377225624"]);

        let newest = repo.orders_for_owner(1, HistorySort::NewestFirst).await.unwrap();
        let numbers: Vec<&str> = newest.iter().map(|o| o.number.as_str()).collect();
        assert_eq!(numbers, vec!["2377225624", "12345678903"]);
    }
}
