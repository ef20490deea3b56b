//! In-memory history table

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use dashmap::DashMap;

use crate::core::traits::LedgerStore;
use crate::types::{AccountId, EntryId, LedgerEntry, TransactionKind};

/// Thread-safe in-memory append-only history table
///
/// Entry ids are assigned from a process-wide counter starting at 1, so ids
/// are strictly increasing in append order across all accounts.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    entries: DashMap<AccountId, Vec<LedgerEntry>>,
    next_id: AtomicU64,
    latency: Option<Duration>,
}

impl InMemoryLedgerStore {
    /// Create an empty store with no injected latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that sleeps `latency` on every call
    pub fn with_latency(latency: Duration) -> Self {
        InMemoryLedgerStore {
            entries: DashMap::new(),
            next_id: AtomicU64::new(0),
            latency: Some(latency),
        }
    }

    fn throttle(&self) {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
    }

    fn assign_id(&self) -> EntryId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionKind,
        timestamp_ms: i64,
    ) -> LedgerEntry {
        self.throttle();
        let entry = LedgerEntry {
            id: self.assign_id(),
            account,
            amount,
            kind,
            timestamp_ms,
        };
        self.entries
            .entry(account)
            .or_default()
            .push(entry.clone());
        entry
    }

    fn list_by_account(&self, account: AccountId) -> Vec<LedgerEntry> {
        self.throttle();
        self.entries
            .get(&account)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}
