//! Core types used throughout the system
//!
//! Type aliases shared by the order, ledger and auth modules.

use rust_decimal::Decimal;

/// User ID - assigned by the store on registration, immutable afterwards.
///
/// # Usage:
/// - Primary key of `users_tb`
/// - Owner of orders and ledger entries
/// - JWT `sub` claim
pub type UserId = i64;

/// Loyalty points amount.
///
/// Points are money-like: they are never represented as floats internally.
/// JSON boundaries render them as numbers via `rust_decimal::serde::float`.
pub type Points = Decimal;

/// Ledger entry ID - auto-incrementing, store-assigned
pub type EntryId = i64;
