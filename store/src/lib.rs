//! `RocksDB` storage layer for the Nocta credit ledger.
//!
//! This crate provides durable state for accounts, transactions, payouts
//! and the audit trail, using `RocksDB` with column families for indexing.
//!
//! # Atomicity
//!
//! Every balance-changing operation is a *compound* operation: it acquires
//! the owning account's exclusive section, reads the committed state,
//! validates its precondition and commits one `WriteBatch` containing the
//! ledger row and the updated account record. There is no path that inserts
//! a transaction and updates a balance as two separate writes, and a failed
//! write commits nothing.
//!
//! Plain reads run unsynchronized against the latest committed snapshot.
//!
//! # Example
//!
//! ```no_run
//! use nocta_store::{RocksStore, Store};
//! use nocta_core::{Account, AccountId, AccountKind, CreditTransaction};
//!
//! let store = RocksStore::open("/tmp/nocta-ledger").unwrap();
//!
//! let account = Account::new(AccountId::generate(), AccountKind::User);
//! store.put_account(&account).unwrap();
//!
//! let spend = CreditTransaction::spend(account.id, 100, "boost".into());
//! let result = store.append_transaction(&spend);
//! assert!(result.is_err()); // empty account, insufficient credits
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod locks;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use locks::{AccountGuard, AccountLocks};
pub use rocks::RocksStore;

use nocta_core::{
    Account, AccountId, AdminAction, AdminId, CreditTransaction, Payout, PayoutId, TransactionId,
};

/// Outcome requested when settling a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Payment confirmed: apply the credit.
    Confirmed,
    /// Payment failed or was cancelled: terminal, no balance effect.
    Failed,
}

/// Result of attempting to complete a payout.
///
/// Both arms are *committed* outcomes: when the balance raced below the
/// payout amount, the payout has already transitioned to `failed`. The
/// debit and the completion are one atomic unit and are never split.
#[derive(Debug, Clone)]
pub enum PayoutSettlement {
    /// The debit was applied and the payout is complete.
    Completed {
        /// The completed payout, `processed_at` set.
        payout: Payout,
        /// The ledger debit that was recorded.
        debit: CreditTransaction,
    },
    /// The balance no longer covered the amount; the payout was committed
    /// as failed with no ledger effect.
    InsufficientBalance {
        /// The failed payout.
        payout: Payout,
        /// The balance observed under the lock.
        balance: u64,
    },
}

/// The storage trait defining all ledger database operations.
///
/// Abstracts the storage layer so the business crates can be exercised
/// against alternative implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>>;

    /// Find the transaction recorded for a payment reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_by_payment_ref(&self, payment_ref: &str) -> Result<Option<CreditTransaction>>;

    /// List transactions for an account, newest first. Pure limit/offset;
    /// the sequence is restartable from any offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;

    /// Append a ledger entry atomically.
    ///
    /// A `pending` entry is recorded without a balance effect (its payment
    /// reference is indexed for later settlement). A `completed` entry
    /// applies its balance effect in the same batch that inserts the row.
    /// Returns the balance after the append.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the amount is zero.
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if a debit would overdraw.
    /// - `StoreError::DuplicatePaymentRef` if the reference is taken.
    /// - `StoreError::Busy` on lock timeout.
    fn append_transaction(&self, transaction: &CreditTransaction) -> Result<u64>;

    /// Settle a pending transaction: `pending -> completed` (credit applied)
    /// or `pending -> failed` (no effect). Returns the settled record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction doesn't exist.
    /// - `StoreError::AlreadyProcessed` if it is not pending (idempotency
    ///   guard for webhook redelivery).
    /// - `StoreError::Busy` on lock timeout.
    fn settle_transaction(
        &self,
        transaction_id: &TransactionId,
        outcome: SettleOutcome,
    ) -> Result<CreditTransaction>;

    /// Refund a completed transaction: marks the original `refunded` and
    /// appends the inverse-effect refund entry in one batch. Returns the
    /// refund entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the original doesn't exist.
    /// - `StoreError::AlreadyRefunded` on a second call (no second effect).
    /// - `StoreError::InvalidTransition` if the original never completed.
    /// - `StoreError::InsufficientCredits` if clawing back a credit would
    ///   overdraw the balance.
    /// - `StoreError::Busy` on lock timeout.
    fn append_refund(&self, original_id: &TransactionId) -> Result<CreditTransaction>;

    /// Commit both legs of a transfer atomically: debit the source, credit
    /// the destination, either both visible or neither. Returns the new
    /// `(source, destination)` balances.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the legs are malformed.
    /// - `StoreError::NotFound` if either account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the source can't cover it.
    /// - `StoreError::Busy` on lock timeout.
    fn append_transfer(
        &self,
        out_leg: &CreditTransaction,
        in_leg: &CreditTransaction,
    ) -> Result<(u64, u64)>;

    // =========================================================================
    // Payouts
    // =========================================================================

    /// Get a payout by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payout(&self, payout_id: &PayoutId) -> Result<Option<Payout>>;

    /// List payouts for an account, newest first, pure limit/offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_payouts(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Payout>>;

    /// Sum of pending and processing payout amounts for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn reserved_amount(&self, account_id: &AccountId) -> Result<u64>;

    /// Insert a pending payout, re-checking the reservation invariant
    /// (`amount <= balance - reserved`) under the account lock so that
    /// concurrent requests cannot jointly exceed the balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if the amount is zero.
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the available balance doesn't
    ///   cover the amount.
    /// - `StoreError::Busy` on lock timeout.
    fn create_payout(&self, payout: &Payout) -> Result<()>;

    /// Move a payout `pending -> processing`, re-validating that the
    /// balance still covers it.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the payout doesn't exist.
    /// - `StoreError::StaleBalance` if the balance raced below the amount;
    ///   the payout stays pending.
    /// - `StoreError::AlreadyProcessed` if it is already processing.
    /// - `StoreError::InvalidTransition` from a terminal state.
    /// - `StoreError::Busy` on lock timeout.
    fn approve_payout(&self, payout_id: &PayoutId) -> Result<Payout>;

    /// Move a payout `processing -> completed`, appending the payout debit
    /// and setting `processed_at` in the same batch. If the balance raced
    /// below the amount the payout is committed as `failed` instead; see
    /// [`PayoutSettlement`].
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the payout doesn't exist.
    /// - `StoreError::AlreadyProcessed` if it is already completed.
    /// - `StoreError::InvalidTransition` if it was never approved.
    /// - `StoreError::Busy` on lock timeout.
    fn complete_payout(&self, payout_id: &PayoutId) -> Result<PayoutSettlement>;

    /// Move a payout `pending|processing -> failed` with a reason. No
    /// ledger effect.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the payout doesn't exist.
    /// - `StoreError::AlreadyProcessed` if it already failed.
    /// - `StoreError::InvalidTransition` if it already completed.
    /// - `StoreError::Busy` on lock timeout.
    fn fail_payout(&self, payout_id: &PayoutId, reason: &str) -> Result<Payout>;

    // =========================================================================
    // Audit trail
    // =========================================================================

    /// Append an audit entry. Entries are never mutated or deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_action(&self, action: &AdminAction) -> Result<()>;

    /// List actions recorded against a target, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_actions_by_target(
        &self,
        target_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>>;

    /// List actions recorded by an actor, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_actions_by_actor(
        &self,
        actor_id: &AdminId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>>;

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Fold the committed transaction log into a balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Integrity` if the log itself sums negative.
    fn recompute_balance(&self, account_id: &AccountId) -> Result<u64>;

    /// Check the cached balance against the log fold.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Integrity` on mismatch. The caller should treat
    /// this as an alarm, not correct it silently.
    fn verify_account(&self, account_id: &AccountId) -> Result<()>;
}
