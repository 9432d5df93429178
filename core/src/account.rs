//! Account types for the Nocta ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A ledger account.
///
/// The `balance` field is a cache of the committed transaction log and is
/// only ever written together with the transaction that changes it. It can
/// always be reconciled by folding the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The account ID.
    pub id: AccountId,

    /// Whether this account belongs to a user or a club.
    pub kind: AccountKind,

    /// Current credit balance.
    pub balance: u64,

    /// Lifetime credits purchased (confirmed purchases only).
    pub total_purchased: u64,

    /// Lifetime credits spent (completed spend debits only).
    pub total_spent: u64,

    /// When the last purchase was confirmed.
    pub last_purchase_at: Option<DateTime<Utc>>,

    /// Monotonic version, incremented on every committed balance write.
    pub version: u64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(id: AccountId, kind: AccountKind) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            balance: 0,
            total_purchased: 0,
            total_spent: 0,
            last_purchase_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can cover a debit of `amount`.
    #[must_use]
    pub const fn has_sufficient_credits(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// The read-only balance view handed to dashboards.
    #[must_use]
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            balance: self.balance,
            total_purchased: self.total_purchased,
            total_spent: self.total_spent,
            last_purchase_at: self.last_purchase_at,
        }
    }
}

/// Kind of ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// A platform user.
    User,
    /// A club.
    Club,
}

/// Point-in-time balance view of a single committed snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Current credit balance.
    pub balance: u64,
    /// Lifetime credits purchased.
    pub total_purchased: u64,
    /// Lifetime credits spent.
    pub total_spent: u64,
    /// When the last purchase was confirmed.
    pub last_purchase_at: Option<DateTime<Utc>>,
}
