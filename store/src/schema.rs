//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `account_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Credit transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by account, keyed by `account_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_ACCOUNT: &str = "transactions_by_account";

    /// Index: pending purchase lookup, keyed by `payment_ref`.
    /// Value is the transaction ID bytes.
    pub const PAYMENT_REFS: &str = "payment_refs";

    /// Payout requests, keyed by `payout_id` (ULID).
    pub const PAYOUTS: &str = "payouts";

    /// Index: payouts by account, keyed by `account_id || payout_id`.
    /// Value is empty (index only).
    pub const PAYOUTS_BY_ACCOUNT: &str = "payouts_by_account";

    /// Audit trail entries, keyed by `action_id` (ULID).
    pub const ADMIN_ACTIONS: &str = "admin_actions";

    /// Index: actions by target, keyed by `target_id || 0x00 || action_id`.
    /// Value is empty (index only).
    pub const ACTIONS_BY_TARGET: &str = "actions_by_target";

    /// Index: actions by actor, keyed by `actor_id || action_id`.
    /// Value is empty (index only).
    pub const ACTIONS_BY_ACTOR: &str = "actions_by_actor";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_ACCOUNT,
        cf::PAYMENT_REFS,
        cf::PAYOUTS,
        cf::PAYOUTS_BY_ACCOUNT,
        cf::ADMIN_ACTIONS,
        cf::ACTIONS_BY_TARGET,
        cf::ACTIONS_BY_ACTOR,
    ]
}
