//! Error taxonomy for ledger operations.
//!
//! Callers are expected to branch on these: validation failures and
//! insufficient credits are the caller's to fix, `Busy` is transient and
//! retryable with backoff, the idempotency guards (`AlreadyRefunded`,
//! `AlreadyProcessed`) mean the work is already done, and `Integrity` is an
//! alarm that should page somebody.

use nocta_store::StoreError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger business layer.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Bad input: non-positive amount, missing field, self-transfer.
    /// Caller's fault; never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced account, transaction, payout or package is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// The balance doesn't cover the debit. Permanent; surface to the user.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Balance available to the operation.
        balance: u64,
        /// Required amount.
        required: u64,
    },

    /// The balance no longer covers a payout that was admissible when
    /// requested.
    #[error("stale balance: available={available}, requested={requested}")]
    StaleBalance {
        /// Credits currently available.
        available: u64,
        /// The payout amount.
        requested: u64,
    },

    /// Idempotency guard: the transaction was already refunded. The second
    /// call produced no effect.
    #[error("already refunded: {transaction_id}")]
    AlreadyRefunded {
        /// The original transaction.
        transaction_id: String,
    },

    /// Idempotency guard: the record was already settled.
    #[error("already processed: {id}")]
    AlreadyProcessed {
        /// The transaction or payout.
        id: String,
    },

    /// Illegal lifecycle move.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Transient lock contention. Safe to retry with bounded backoff.
    #[error("ledger busy, retry later")]
    Busy,

    /// The balance invariant does not hold. The operation was aborted.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The payment gateway rejected or failed the request.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether a caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Storage(msg),
            StoreError::NotFound => Self::NotFound("record not found".into()),
            StoreError::InvalidAmount => Self::Validation("amount must be positive".into()),
            StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            StoreError::StaleBalance {
                available,
                requested,
            } => Self::StaleBalance {
                available,
                requested,
            },
            StoreError::AlreadyRefunded { transaction_id } => {
                Self::AlreadyRefunded { transaction_id }
            }
            StoreError::AlreadyProcessed { id } => Self::AlreadyProcessed { id },
            StoreError::DuplicatePaymentRef { payment_ref } => {
                Self::AlreadyProcessed { id: payment_ref }
            }
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StoreError::Busy => Self::Busy,
            StoreError::Integrity(msg) => Self::Integrity(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_busy_is_transient() {
        assert!(LedgerError::Busy.is_transient());
        assert!(!LedgerError::Validation("x".into()).is_transient());
        assert!(!LedgerError::InsufficientCredits {
            balance: 0,
            required: 1
        }
        .is_transient());
    }

    #[test]
    fn store_errors_map_onto_taxonomy() {
        assert!(matches!(
            LedgerError::from(StoreError::Busy),
            LedgerError::Busy
        ));
        assert!(matches!(
            LedgerError::from(StoreError::InvalidAmount),
            LedgerError::Validation(_)
        ));
        assert!(matches!(
            LedgerError::from(StoreError::InsufficientCredits {
                balance: 5,
                required: 10
            }),
            LedgerError::InsufficientCredits {
                balance: 5,
                required: 10
            }
        ));
    }
}
