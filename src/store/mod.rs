//! In-memory backing tables
//!
//! Stand-ins for the real balance and history tables. Both are thread-safe
//! (DashMap) but provide only per-key atomic reads and writes; they carry no
//! cross-call transactionality, which is exactly the collaborator contract
//! the coordinator's lock compensates for.
//!
//! Both stores accept an optional fixed per-call latency. The tables these
//! mimic throttled randomly to make lost updates observable; a deterministic
//! latency serves the same purpose in tests and demonstration runs.

pub mod account;
pub mod ledger;

pub use account::InMemoryAccountStore;
pub use ledger::InMemoryLedgerStore;
