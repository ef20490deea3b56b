//! Ledger-related types for the point ledger
//!
//! Every committed balance mutation is recorded as exactly one immutable
//! `LedgerEntry`. The ledger is append-only; entries reference their account
//! but do not own the balance.

use super::account::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger entry identifier, assigned by the ledger store starting at 1
pub type EntryId = u64;

/// The two kinds of balance mutation
///
/// Serialized in lowercase (`charge` / `use`) for CSV interchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credit points onto an account
    Charge,

    /// Spend points from an account
    Use,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Charge => write!(f, "charge"),
            TransactionKind::Use => write!(f, "use"),
        }
    }
}

/// One committed balance mutation
///
/// Immutable once written. The `amount` is always the positive magnitude of
/// the mutation; the direction is carried by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Store-assigned entry id
    pub id: EntryId,

    /// The account whose balance was mutated
    pub account: AccountId,

    /// Magnitude of the mutation
    pub amount: i64,

    /// Whether the mutation was a charge or a use
    pub kind: TransactionKind,

    /// Unix timestamp (milliseconds) at which the mutation committed
    pub timestamp_ms: i64,
}
