//! Account-related types for the point ledger
//!
//! This module defines the `BalanceAccount` structure holding the current
//! point balance of a single account.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Account identifier
///
/// `0` is the nil sentinel and is rejected by the lock layer; every real
/// account id is a positive integer.
pub type AccountId = u64;

/// Current point balance of one account
///
/// Exactly one `BalanceAccount` exists per `AccountId`. Accounts are created
/// on first reference with a zero balance and are never deleted. The balance
/// is mutated only inside the account's exclusive region, so a committed
/// balance is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceAccount {
    /// The account this balance belongs to
    pub id: AccountId,

    /// Current point balance
    ///
    /// Invariant: `balance >= 0` after every committed transition.
    pub balance: i64,

    /// Unix timestamp (milliseconds) of the last committed mutation
    pub updated_at_ms: i64,
}

impl BalanceAccount {
    /// Create a zero-balance account for an id that has no stored state yet
    pub fn empty(id: AccountId) -> Self {
        BalanceAccount {
            id,
            balance: 0,
            updated_at_ms: now_ms(),
        }
    }
}

/// Current wall-clock time as Unix milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_account_has_zero_balance() {
        let account = BalanceAccount::empty(7);
        assert_eq!(account.id, 7);
        assert_eq!(account.balance, 0);
        assert!(account.updated_at_ms > 0);
    }
}
