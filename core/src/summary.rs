//! Derived summary views.
//!
//! Summaries are computed from committed ledger state on demand and never
//! stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credit overview for a club dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubCreditSummary {
    /// Current balance.
    pub balance: u64,
    /// Sum of all completed credit entries.
    pub total_earned: u64,
    /// Sum of all completed spend debits.
    pub total_spent: u64,
    /// Sum of pending and processing payout amounts.
    pub pending_withdrawals: u64,
    /// `balance - pending_withdrawals`.
    pub available_for_withdrawal: u64,
}

/// Earnings breakdown for a creator dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Completed credits received as gifts.
    pub credits_from_gifts: u64,
    /// Completed credits earned from fan posts.
    pub credits_from_fanposts: u64,
    /// Credits paid out (completed payout debits).
    pub credits_payouts: u64,
    /// Balance minus reserved payout amounts.
    pub credits_available: u64,
    /// When the last payout completed.
    pub last_payout_at: Option<DateTime<Utc>>,
}
