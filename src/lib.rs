//! Point Ledger Library
//! # Overview
//!
//! This library maintains per-account point balances mutated exclusively and
//! consistently under concurrent access, recording every committed mutation
//! as an immutable ledger entry.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (BalanceAccount, LedgerEntry, errors)
//! - [`lock`] - The concurrency-control core:
//!   - [`lock::registry`] - One reclaimable lock per logical key
//!   - [`lock::template`] - Timeout/retry-bounded execution under a key's lock
//! - [`core`] - Business logic components:
//!   - [`core::policy`] - Admission rules for balance transitions
//!   - [`core::coordinator`] - The read-validate-write-append sequence
//! - [`store`] - In-memory backing tables (balances and history)
//! - [`io`] - CSV interchange for batch runs
//! - [`cli`] - CLI argument parsing
//!
//! # Concurrency Model
//!
//! All mutations of one account funnel through that account's lock, handed
//! out by the registry and acquired with a deadline by the template. For a
//! fixed account, committed mutations are totally ordered by lock-acquisition
//! order; plain balance reads are not ordered against in-flight mutations.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod lock;
pub mod store;
pub mod types;

pub use crate::core::{AccountStore, BalancePolicy, LedgerStore, TransactionCoordinator};
pub use io::{read_operations_csv, write_balances_csv, OperationRecord};
pub use lock::{LockConfig, LockError, LockRegistry, LockTemplate};
pub use store::{InMemoryAccountStore, InMemoryLedgerStore};
pub use types::{AccountId, BalanceAccount, EntryId, LedgerEntry, PointError, TransactionKind};
