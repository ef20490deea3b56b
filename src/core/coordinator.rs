//! Transaction coordination
//!
//! The end-to-end read-modify-write performed under lock: load the current
//! balance, validate the transition, compute the new balance, persist it,
//! and append a ledger entry. All five steps run inside the account's
//! exclusive region, so they appear atomic to every other transaction on
//! the same account even though the two stores share no transaction of
//! their own.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::core::policy::BalancePolicy;
use crate::core::traits::{AccountStore, LedgerStore};
use crate::lock::{LockError, LockTemplate};
use crate::types::{AccountId, BalanceAccount, LedgerEntry, PointError, TransactionKind};

/// Orchestrates balance mutations under per-account locks
///
/// Cloneable; every clone shares the same stores and the same lock registry,
/// so concurrent clones serialize correctly per account.
pub struct TransactionCoordinator<A: AccountStore, L: LedgerStore> {
    accounts: Arc<A>,
    ledger: Arc<L>,
    template: LockTemplate<AccountId>,
}

impl<A: AccountStore, L: LedgerStore> Clone for TransactionCoordinator<A, L> {
    fn clone(&self) -> Self {
        TransactionCoordinator {
            accounts: Arc::clone(&self.accounts),
            ledger: Arc::clone(&self.ledger),
            template: self.template.clone(),
        }
    }
}

impl<A: AccountStore, L: LedgerStore> TransactionCoordinator<A, L> {
    /// Create a coordinator over the given stores and lock template
    pub fn new(accounts: Arc<A>, ledger: Arc<L>, template: LockTemplate<AccountId>) -> Self {
        TransactionCoordinator {
            accounts,
            ledger,
            template,
        }
    }

    /// Charge points onto an account
    ///
    /// # Errors
    ///
    /// Policy violations (`InvalidAmount`, `BalanceLimitExceeded`) surface
    /// verbatim and leave the stores untouched; lock failures surface as
    /// `LockTimeout` / `LockInterrupted` with zero mutation.
    pub fn charge(&self, account: AccountId, amount: i64) -> Result<BalanceAccount, PointError> {
        self.mutate(account, amount, TransactionKind::Charge)
    }

    /// Use (spend) points from an account
    ///
    /// # Errors
    ///
    /// Policy violations (`InvalidAmount`, `InsufficientBalance`) surface
    /// verbatim and leave the stores untouched; lock failures surface as
    /// `LockTimeout` / `LockInterrupted` with zero mutation.
    pub fn use_points(
        &self,
        account: AccountId,
        amount: i64,
    ) -> Result<BalanceAccount, PointError> {
        self.mutate(account, amount, TransactionKind::Use)
    }

    /// Current balance for `account`
    ///
    /// An unlocked read: not ordered against concurrent mutations, it may
    /// observe any balance between the last committed value and an in-flight
    /// mutation's result. Unknown accounts read as zero balance.
    pub fn balance_of(&self, account: AccountId) -> BalanceAccount {
        self.accounts.get(account)
    }

    /// All committed mutations for `account` in insertion order
    pub fn history_of(&self, account: AccountId) -> Vec<LedgerEntry> {
        self.ledger.list_by_account(account)
    }

    /// Load -> validate -> compute -> persist -> append, under the
    /// account's lock; no step skipped or reordered
    fn mutate(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionKind,
    ) -> Result<BalanceAccount, PointError> {
        let started = Instant::now();

        let outcome = self.template.execute_with_lock(&account, || {
            let current = self.accounts.get(account);
            BalancePolicy::from(kind).validate(current.balance, amount)?;

            let new_balance = match kind {
                TransactionKind::Charge => current.balance + amount,
                TransactionKind::Use => current.balance - amount,
            };
            let updated = self.accounts.put(account, new_balance);
            self.ledger
                .append(account, amount, kind, updated.updated_at_ms);

            debug!(
                account,
                origin = current.balance,
                remaining = updated.balance,
                %kind,
                "balance mutated"
            );
            Ok(updated)
        });

        let result = outcome.map_err(|err| flatten_lock_error(account, err));
        info!(
            account,
            %kind,
            amount,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "operation finished"
        );
        result
    }
}

/// Collapse lock-layer failures into the service error taxonomy
///
/// Execution failures surface their cause verbatim: the block already ran
/// (or was rejected by policy) under exclusive access, and the cause is what
/// the caller needs to act on.
fn flatten_lock_error(account: AccountId, error: LockError<PointError>) -> PointError {
    match error {
        LockError::InvalidKey => PointError::InvalidAccountKey,
        LockError::Timeout {
            waited_ms,
            attempts,
        } => PointError::LockTimeout {
            account,
            waited_ms,
            attempts,
        },
        LockError::Interrupted => PointError::LockInterrupted { account },
        LockError::Execution { source } => source,
    }
}
