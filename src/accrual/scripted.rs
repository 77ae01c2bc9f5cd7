//! In-process oracle with a scripted verdict table

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AccrualOracle, OracleError, Verdict};

/// Oracle that answers from a table set by the caller.
///
/// Numbers without an entry answer `NotRegistered`, like an accrual service
/// that has not seen the order yet.
#[derive(Default)]
pub struct ScriptedOracle {
    answers: Mutex<HashMap<String, Result<Verdict, OracleError>>>,
    queries: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the answer for `number`; replaces any earlier one
    pub fn set(&self, number: &str, answer: Result<Verdict, OracleError>) {
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(number.to_string(), answer);
    }

    pub fn set_verdict(&self, number: &str, verdict: Verdict) {
        self.set(number, Ok(verdict));
    }

    pub fn forget(&self, number: &str) {
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(number);
    }

    /// Total queries served
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccrualOracle for ScriptedOracle {
    async fn query(&self, order_number: &str) -> Result<Verdict, OracleError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(order_number)
            .cloned()
            .unwrap_or(Err(OracleError::NotRegistered))
    }
}
