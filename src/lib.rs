//! Loyalty Mart - loyalty points back end
//!
//! Users upload purchase order numbers; a background worker asks an external
//! accrual oracle how many points each order earned and credits them to an
//! append-only ledger; users spend points through withdrawals that can never
//! overdraw.
//!
//! # Modules
//!
//! - [`order`] - Order numbers (Luhn), statuses, ledger models
//! - [`repository`] - Storage seam: PostgreSQL and in-memory
//! - [`accrual`] - Accrual oracle client and verdicts
//! - [`reconciliation`] - Background worker driving orders to terminal state
//! - [`intake`] - Order upload and history
//! - [`withdrawal`] - Overdraft-safe withdrawals
//! - [`ledger`] - Balance and withdrawal history
//! - [`user_auth`] - Registration, login, JWT
//! - [`gateway`] - HTTP API

// Core types - must be first!
pub mod core_types;

pub mod accrual;
pub mod config;
pub mod db;
pub mod gateway;
pub mod intake;
pub mod ledger;
pub mod logging;
pub mod order;
pub mod reconciliation;
pub mod repository;
pub mod user_auth;
pub mod withdrawal;

pub use core_types::{EntryId, Points, UserId};
pub use order::{Order, OrderNumber, OrderStatus};
