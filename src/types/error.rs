//! Error types for the point ledger
//!
//! This module defines all errors a caller of the service can observe.
//! Policy violations, lock failures, and I/O problems are distinct variants
//! so a presentation layer can map them to distinct responses (a rejected
//! amount is a bad request, a lock timeout is a retry-later condition).
//!
//! # Error Categories
//!
//! - **Policy violations**: amount below minimum, balance limit exceeded,
//!   insufficient balance. Never retried; no mutation occurs.
//! - **Lock failures**: timeout or interruption while waiting for an
//!   account's exclusive region. No mutation occurs.
//! - **I/O and parse errors**: batch input could not be read or decoded.

use super::account::AccountId;
use super::ledger::TransactionKind;
use thiserror::Error;

/// Main error type for the point ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// The nil account key (`0`) was passed to an operation
    ///
    /// This is a programmer error on the caller's side and is never retried.
    #[error("account key cannot be the nil sentinel (0)")]
    InvalidAccountKey,

    /// The requested amount is below the minimum for its transaction kind
    #[error("{kind} amount {amount} is below the minimum of {minimum}")]
    InvalidAmount {
        /// The kind of mutation that was requested
        kind: TransactionKind,
        /// The rejected amount
        amount: i64,
        /// The minimum admissible amount for this kind
        minimum: i64,
    },

    /// Charging the amount would push the balance past the maximum
    #[error("charging {amount} onto balance {current} would exceed the maximum balance of {max}")]
    BalanceLimitExceeded {
        /// Balance before the rejected charge
        current: i64,
        /// The rejected charge amount
        amount: i64,
        /// The maximum balance an account may hold
        max: i64,
    },

    /// Using the amount would drive the balance negative
    #[error("insufficient balance: current {current}, requested {requested}")]
    InsufficientBalance {
        /// Balance before the rejected use
        current: i64,
        /// The rejected use amount
        requested: i64,
    },

    /// The exclusive region for the account could not be entered in time
    ///
    /// A transient-failure signal; the caller may retry the whole call later.
    /// No mutation has occurred.
    #[error("failed to acquire the lock for account {account} within {waited_ms} ms ({attempts} attempts)")]
    LockTimeout {
        /// The account whose lock was contended
        account: AccountId,
        /// Cumulative time spent waiting
        waited_ms: u64,
        /// Number of acquisition attempts made
        attempts: u32,
    },

    /// Waiting for the account's lock was interrupted (registry shut down)
    #[error("interrupted while waiting for the lock for account {account}")]
    LockInterrupted {
        /// The account whose lock was being waited on
        account: AccountId,
    },

    /// Input file not found at the specified path
    #[error("file not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading input or writing output
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV decode error in the operation input
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for PointError {
    fn from(error: std::io::Error) -> Self {
        PointError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for PointError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PointError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl PointError {
    /// Whether this error is a policy violation (mutation rejected before
    /// any store write)
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            PointError::InvalidAmount { .. }
                | PointError::BalanceLimitExceeded { .. }
                | PointError::InsufficientBalance { .. }
        )
    }

    /// Whether this error is a transient lock failure worth retrying later
    pub fn is_transient(&self) -> bool {
        matches!(self, PointError::LockTimeout { .. })
    }
}
