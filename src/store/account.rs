//! In-memory balance table

use std::thread;
use std::time::Duration;

use dashmap::DashMap;

use crate::core::traits::AccountStore;
use crate::types::{now_ms, AccountId, BalanceAccount};

/// Thread-safe in-memory balance table
///
/// Reads for unknown ids return a zero-balance account; writes upsert and
/// stamp the stored row with the current time. Each call is all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<AccountId, BalanceAccount>,
    latency: Option<Duration>,
}

impl InMemoryAccountStore {
    /// Create an empty store with no injected latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that sleeps `latency` on every call
    pub fn with_latency(latency: Duration) -> Self {
        InMemoryAccountStore {
            accounts: DashMap::new(),
            latency: Some(latency),
        }
    }

    fn throttle(&self) {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get(&self, id: AccountId) -> BalanceAccount {
        self.throttle();
        self.accounts
            .get(&id)
            .map(|account| account.clone())
            .unwrap_or_else(|| BalanceAccount::empty(id))
    }

    fn put(&self, id: AccountId, balance: i64) -> BalanceAccount {
        self.throttle();
        let account = BalanceAccount {
            id,
            balance,
            updated_at_ms: now_ms(),
        };
        self.accounts.insert(id, account.clone());
        account
    }
}
