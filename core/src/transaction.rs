//! Credit transaction types.
//!
//! Every balance change is recorded as a `CreditTransaction`. Records are
//! immutable once written; only `status` may move, and only along
//! `pending -> completed | failed` or `completed -> refunded`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, PayoutId, TransactionId};

/// A single entry in the credit ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID, time-ordered).
    pub id: TransactionId,

    /// The account whose balance this entry affects.
    pub account_id: AccountId,

    /// What kind of event produced this entry.
    pub kind: TransactionKind,

    /// Which side of the balance the amount lands on.
    ///
    /// Implied by `kind` for everything except admin adjustments, which can
    /// point either way, and refunds, which invert the original entry.
    pub direction: EntryDirection,

    /// Amount in credits. Always positive; `direction` carries the sign.
    pub amount: u64,

    /// Lifecycle status. The only mutable field.
    pub status: TransactionStatus,

    /// Earning source tag for earned credits (gifts, fan posts).
    pub source: Option<EarningSource>,

    /// Credit package this purchase was for.
    pub package_id: Option<String>,

    /// External payment reference for purchases awaiting confirmation.
    pub payment_ref: Option<String>,

    /// Link to a related entry: the refunded original, the opposite
    /// transfer leg, or nothing.
    pub linked_tx: Option<TransactionId>,

    /// Human-readable description.
    pub description: String,

    /// Free-form metadata.
    pub metadata: serde_json::Value,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// A purchase awaiting payment confirmation. Carries no balance effect
    /// until settled.
    #[must_use]
    pub fn purchase(
        account_id: AccountId,
        amount: u64,
        package_id: String,
        payment_ref: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::Purchase,
            direction: EntryDirection::Credit,
            amount,
            status: TransactionStatus::Pending,
            source: None,
            package_id: Some(package_id),
            payment_ref: Some(payment_ref),
            linked_tx: None,
            description: format!("Purchase of {amount} credits"),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// An immediately-completed spend debit.
    #[must_use]
    pub fn spend(account_id: AccountId, amount: u64, description: String) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::Spend,
            direction: EntryDirection::Debit,
            amount,
            status: TransactionStatus::Completed,
            source: None,
            package_id: None,
            payment_ref: None,
            linked_tx: None,
            description,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// The inverse-effect refund of a completed entry.
    #[must_use]
    pub fn refund_of(original: &CreditTransaction) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id: original.account_id,
            kind: TransactionKind::Refund,
            direction: original.direction.inverse(),
            amount: original.amount,
            status: TransactionStatus::Completed,
            source: None,
            package_id: None,
            payment_ref: None,
            linked_tx: Some(original.id),
            description: format!("Refund of {}", original.id),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Both legs of a transfer, linked to each other. The in-leg carries the
    /// optional earning source tag.
    #[must_use]
    pub fn transfer_pair(
        from: AccountId,
        to: AccountId,
        amount: u64,
        source: Option<EarningSource>,
        description: String,
    ) -> (Self, Self) {
        let out_id = TransactionId::generate();
        let in_id = TransactionId::generate();
        let now = Utc::now();

        let out_leg = Self {
            id: out_id,
            account_id: from,
            kind: TransactionKind::TransferOut,
            direction: EntryDirection::Debit,
            amount,
            status: TransactionStatus::Completed,
            source: None,
            package_id: None,
            payment_ref: None,
            linked_tx: Some(in_id),
            description: description.clone(),
            metadata: serde_json::Value::Null,
            created_at: now,
        };
        let in_leg = Self {
            id: in_id,
            account_id: to,
            kind: TransactionKind::TransferIn,
            direction: EntryDirection::Credit,
            amount,
            status: TransactionStatus::Completed,
            source,
            package_id: None,
            payment_ref: None,
            linked_tx: Some(out_id),
            description,
            metadata: serde_json::Value::Null,
            created_at: now,
        };
        (out_leg, in_leg)
    }

    /// A privileged balance correction. Completes immediately.
    #[must_use]
    pub fn admin_adjustment(
        account_id: AccountId,
        amount: u64,
        direction: EntryDirection,
        reason: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::AdminAdjustment,
            direction,
            amount,
            status: TransactionStatus::Completed,
            source: None,
            package_id: None,
            payment_ref: None,
            linked_tx: None,
            description: reason,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// The debit recorded when a payout completes.
    #[must_use]
    pub fn payout_debit(account_id: AccountId, amount: u64, payout_id: PayoutId) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::Payout,
            direction: EntryDirection::Debit,
            amount,
            status: TransactionStatus::Completed,
            source: None,
            package_id: None,
            payment_ref: None,
            linked_tx: None,
            description: format!("Payout {payout_id}"),
            metadata: serde_json::json!({ "payout_id": payout_id.to_string() }),
            created_at: Utc::now(),
        }
    }

    /// Whether this entry currently counts toward the balance.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Completed | TransactionStatus::Refunded
        )
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credits bought through the payment gateway.
    Purchase,
    /// Credits spent on platform features.
    Spend,
    /// Inverse of a previously completed entry.
    Refund,
    /// Receiving leg of a transfer.
    TransferIn,
    /// Sending leg of a transfer.
    TransferOut,
    /// Privileged balance correction.
    AdminAdjustment,
    /// Debit recorded when a payout completes.
    Payout,
}

impl TransactionKind {
    /// The fixed direction of this kind, where it has one.
    ///
    /// `AdminAdjustment` and `Refund` have no fixed direction: adjustments
    /// are chosen by the admin and refunds invert their original.
    #[must_use]
    pub const fn fixed_direction(&self) -> Option<EntryDirection> {
        match self {
            Self::Purchase | Self::TransferIn => Some(EntryDirection::Credit),
            Self::Spend | Self::TransferOut | Self::Payout => Some(EntryDirection::Debit),
            Self::Refund | Self::AdminAdjustment => None,
        }
    }
}

/// Which side of the balance an entry lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    /// Adds to the balance.
    Credit,
    /// Subtracts from the balance.
    Debit,
}

impl EntryDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Lifecycle status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded but not yet effective (awaiting payment confirmation).
    Pending,
    /// Effective; counted in the balance.
    Completed,
    /// Terminal; never became effective.
    Failed,
    /// Was completed, then inverted by a linked refund entry. Still counted
    /// in the balance; the refund entry carries the inverse effect.
    Refunded,
}

impl TransactionStatus {
    /// Whether `self -> to` is a legal status move.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Completed, Self::Refunded)
        )
    }
}

/// Source category for earned credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningSource {
    /// Credits received as a gift.
    Gift,
    /// Credits earned from a fan post.
    FanPost,
}
