//! Core business logic module
//!
//! This module contains the point-service components built on the lock layer:
//! - `traits` - collaborator interfaces for the two backing stores
//! - `policy` - admission rules for balance transitions
//! - `coordinator` - the read-validate-write-append sequence run under lock

pub mod coordinator;
pub mod policy;
pub mod traits;

pub use coordinator::TransactionCoordinator;
pub use policy::{BalancePolicy, MAX_BALANCE, MIN_CHARGE_AMOUNT, MIN_USE_AMOUNT};
pub use traits::{AccountStore, LedgerStore};
