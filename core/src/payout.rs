//! Payout request types.
//!
//! A payout converts credits into external currency. It is created by the
//! account holder, mutated only through admin-invoked transitions, and
//! becomes permanent once terminal. While a payout is pending or processing
//! its amount is reserved: it still sits in the balance but is excluded from
//! the withdrawable amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, PayoutId};

/// A request to withdraw credits as external currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Unique payout ID (ULID, time-ordered).
    pub id: PayoutId,

    /// The account withdrawing.
    pub account_id: AccountId,

    /// Amount in credits.
    pub amount: u64,

    /// Current state. See [`PayoutStatus`] for the legal moves.
    pub status: PayoutStatus,

    /// How the money should be sent.
    pub method: PayoutMethod,

    /// Method-specific destination details (IBAN, wallet address, ...).
    pub details: String,

    /// Why the payout failed, when it did.
    pub failure_reason: Option<String>,

    /// When the request was created.
    pub created_at: DateTime<Utc>,

    /// When the payout reached a terminal state with a ledger effect.
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payout {
    /// Create a new pending payout request.
    #[must_use]
    pub fn new(account_id: AccountId, amount: u64, method: PayoutMethod, details: String) -> Self {
        Self {
            id: PayoutId::generate(),
            account_id,
            amount,
            status: PayoutStatus::Pending,
            method,
            details,
            failure_reason: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// Payout lifecycle: `pending -> processing -> completed | failed`, with
/// `failed` also reachable directly from `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Requested, awaiting admin approval.
    Pending,
    /// Approved, being paid out externally.
    Processing,
    /// Paid; the ledger debit has been recorded.
    Completed,
    /// Terminal without a ledger effect.
    Failed,
}

impl PayoutStatus {
    /// Whether `self -> to` is a legal state move.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing | Self::Failed)
                | (Self::Processing, Self::Completed | Self::Failed)
        )
    }

    /// Whether this state reserves funds against the withdrawable amount.
    #[must_use]
    pub const fn reserves_funds(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Whether this state is permanent.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// How a payout is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    /// SEPA/wire bank transfer.
    BankTransfer,
    /// PayPal.
    Paypal,
    /// Cryptocurrency wallet.
    Crypto,
}
