use std::sync::Arc;

use crate::db::Database;
use crate::intake::OrderIntake;
use crate::ledger::LedgerService;
use crate::user_auth::UserAuthService;
use crate::withdrawal::WithdrawalGuard;

/// Gateway application state (shared by all handlers)
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<OrderIntake>,
    pub withdrawals: Arc<WithdrawalGuard>,
    pub ledger: Arc<LedgerService>,
    pub user_auth: Arc<UserAuthService>,
    /// PostgreSQL pool; `None` when running on the in-memory store
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        intake: Arc<OrderIntake>,
        withdrawals: Arc<WithdrawalGuard>,
        ledger: Arc<LedgerService>,
        user_auth: Arc<UserAuthService>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            intake,
            withdrawals,
            ledger,
            user_auth,
            pg_db,
        }
    }
}
