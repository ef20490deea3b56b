//! Balance transition policy
//!
//! Decides whether a proposed balance transition is admissible given the
//! transition kind, current balance, and requested amount. Validation is a
//! pure function of `(current, amount)` and must run *inside* the locked
//! region; evaluated outside it the decision would race against concurrent
//! mutations.

use crate::types::{PointError, TransactionKind};
use tracing::warn;

/// Minimum admissible charge amount
pub const MIN_CHARGE_AMOUNT: i64 = 10_000;

/// Maximum balance an account may hold after a charge
pub const MAX_BALANCE: i64 = 10_000_000_000;

/// Minimum admissible use amount
pub const MIN_USE_AMOUNT: i64 = 1_000;

/// Admission policy for one kind of balance transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Charge policy: amount at least [`MIN_CHARGE_AMOUNT`], resulting
    /// balance at most [`MAX_BALANCE`]
    Charge,

    /// Use policy: amount at least [`MIN_USE_AMOUNT`], resulting balance
    /// never negative
    Use,
}

impl From<TransactionKind> for BalancePolicy {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Charge => BalancePolicy::Charge,
            TransactionKind::Use => BalancePolicy::Use,
        }
    }
}

impl BalancePolicy {
    /// Validate a proposed transition; no side effects
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is below the kind's minimum
    /// - `BalanceLimitExceeded` if a charge would push the balance past
    ///   [`MAX_BALANCE`]
    /// - `InsufficientBalance` if a use would drive the balance negative
    pub fn validate(self, current: i64, amount: i64) -> Result<(), PointError> {
        match self {
            BalancePolicy::Charge => {
                if amount < MIN_CHARGE_AMOUNT {
                    warn!(amount, "rejected charge below minimum");
                    return Err(PointError::InvalidAmount {
                        kind: TransactionKind::Charge,
                        amount,
                        minimum: MIN_CHARGE_AMOUNT,
                    });
                }
                if current.saturating_add(amount) > MAX_BALANCE {
                    warn!(current, amount, "rejected charge past balance limit");
                    return Err(PointError::BalanceLimitExceeded {
                        current,
                        amount,
                        max: MAX_BALANCE,
                    });
                }
                Ok(())
            }
            BalancePolicy::Use => {
                if amount < MIN_USE_AMOUNT {
                    warn!(amount, "rejected use below minimum");
                    return Err(PointError::InvalidAmount {
                        kind: TransactionKind::Use,
                        amount,
                        minimum: MIN_USE_AMOUNT,
                    });
                }
                if current < amount {
                    warn!(current, amount, "rejected use past available balance");
                    return Err(PointError::InsufficientBalance {
                        current,
                        requested: amount,
                    });
                }
                Ok(())
            }
        }
    }
}
