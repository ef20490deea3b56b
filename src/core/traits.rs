//! Collaborator interfaces for the backing stores
//!
//! The coordinator consumes these two interfaces and nothing more. Stores
//! provide per-key atomic read and per-key atomic write primitives of their
//! own but no cross-call transactionality; the keyed lock supplies the
//! effective transaction boundary across the read-validate-write-append
//! sequence. Stores must not apply partial writes: each call is
//! all-or-nothing.

use crate::types::{AccountId, BalanceAccount, LedgerEntry, TransactionKind};

/// Storage of current account balances
pub trait AccountStore: Send + Sync + 'static {
    /// Fetch the account for `id`
    ///
    /// Returns a zero-balance account for an unknown id; never fails.
    fn get(&self, id: AccountId) -> BalanceAccount;

    /// Upsert the balance for `id`, returning the stored result with a
    /// fresh timestamp
    fn put(&self, id: AccountId, balance: i64) -> BalanceAccount;
}

/// Append-only storage of committed balance mutations
pub trait LedgerStore: Send + Sync + 'static {
    /// Append one entry; the store assigns the entry id
    fn append(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionKind,
        timestamp_ms: i64,
    ) -> LedgerEntry;

    /// All entries for `account` in insertion order
    fn list_by_account(&self, account: AccountId) -> Vec<LedgerEntry>;
}
