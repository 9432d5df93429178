//! Error types for the Nocta storage layer.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Amount must be a positive number of credits.
    #[error("invalid amount: must be positive")]
    InvalidAmount,

    /// Insufficient credits for a debit.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Balance available to the operation.
        balance: u64,
        /// Required amount.
        required: u64,
    },

    /// The balance no longer covers a payout that was admissible when it
    /// was requested.
    #[error("stale balance: available={available}, requested={requested}")]
    StaleBalance {
        /// Credits currently available to the payout.
        available: u64,
        /// The payout amount.
        requested: u64,
    },

    /// The transaction was already refunded; no second effect was applied.
    #[error("already refunded: {transaction_id}")]
    AlreadyRefunded {
        /// The original transaction.
        transaction_id: String,
    },

    /// The record was already settled; no second effect was applied.
    #[error("already processed: {id}")]
    AlreadyProcessed {
        /// The transaction or payout that was already settled.
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

    /// A purchase with this payment reference is already recorded.
    #[error("duplicate payment ref: {payment_ref}")]
    DuplicatePaymentRef {
        /// The payment reference.
        payment_ref: String,
    },

    /// Could not acquire the account's critical section in time. Transient;
    /// safe to retry with backoff.
    #[error("account busy: lock acquisition timed out")]
    Busy,

    /// The balance invariant does not hold. Unreachable by construction;
    /// the operation was aborted, nothing was corrected silently.
    #[error("integrity violation: {0}")]
    Integrity(String),
}
