//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Balance account types and identifiers
//! - `ledger`: Ledger entry types and transaction kinds
//! - `error`: Error types for the point ledger

pub mod account;
pub mod error;
pub mod ledger;

pub use account::{now_ms, AccountId, BalanceAccount};
pub use error::PointError;
pub use ledger::{EntryId, LedgerEntry, TransactionKind};
