//! Audit trail types.
//!
//! Every privileged action is recorded as an `AdminAction`. Entries are
//! append-only; there is no update or delete path anywhere in the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActionId, AdminId};

/// A recorded privileged action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAction {
    /// Unique entry ID (ULID, time-ordered).
    pub id: ActionId,

    /// Who performed the action.
    pub actor_id: AdminId,

    /// What was done.
    pub action: AdminActionKind,

    /// What it was done to: an account id, payout id or transaction id,
    /// rendered as a string.
    pub target_id: String,

    /// Why, when the action requires one.
    pub reason: Option<String>,

    /// Free-form operator notes.
    pub notes: Option<String>,

    /// When the action was recorded.
    pub created_at: DateTime<Utc>,
}

impl AdminAction {
    /// Create a new audit entry stamped now.
    #[must_use]
    pub fn new(
        actor_id: AdminId,
        action: AdminActionKind,
        target_id: String,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: ActionId::generate(),
            actor_id,
            action,
            target_id,
            reason,
            notes,
            created_at: Utc::now(),
        }
    }
}

/// Kind of privileged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    /// Balance correction via admin adjustment.
    CreditAdjustment,
    /// Refund issued against a transaction.
    RefundIssued,
    /// Payout moved `pending -> processing`.
    PayoutApproved,
    /// Payout completed and debited.
    PayoutCompleted,
    /// Payout failed (by admin, or automatically on a raced balance).
    PayoutFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_records_actor_and_target() {
        let actor = AdminId::generate();
        let action = AdminAction::new(
            actor,
            AdminActionKind::PayoutApproved,
            "payout-123".into(),
            None,
            Some("checked bank details".into()),
        );

        assert_eq!(action.actor_id, actor);
        assert_eq!(action.target_id, "payout-123");
        assert!(action.reason.is_none());
        assert_eq!(action.notes.as_deref(), Some("checked bank details"));
    }
}
