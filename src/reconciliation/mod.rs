//! Order reconciliation against the accrual oracle

pub mod worker;

pub use worker::{ReconciliationWorker, TickReport, WorkerConfig};
