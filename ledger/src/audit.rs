//! Append-only audit trail of privileged actions.

use std::sync::Arc;

use nocta_core::{ActionId, AdminAction, AdminActionKind, AdminId};
use nocta_store::Store;

use crate::error::Result;

/// Records and lists privileged actions. Entries are append-only; nothing
/// in the system mutates or deletes them.
pub struct AuditTrail<S> {
    store: Arc<S>,
}

impl<S> Clone for AuditTrail<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AuditTrail<S> {
    /// Create an audit trail over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a privileged action.
    ///
    /// # Errors
    ///
    /// Returns an error if the append fails.
    pub fn record(
        &self,
        actor_id: AdminId,
        action: AdminActionKind,
        target_id: String,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<ActionId> {
        let entry = AdminAction::new(actor_id, action, target_id, reason, notes);
        self.store.append_action(&entry)?;

        tracing::info!(
            action_id = %entry.id,
            actor_id = %entry.actor_id,
            action = ?entry.action,
            target_id = %entry.target_id,
            "Admin action recorded"
        );
        Ok(entry.id)
    }

    /// Actions recorded against a target, newest first. Restartable by
    /// offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn for_target(
        &self,
        target_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>> {
        Ok(self.store.list_actions_by_target(target_id, limit, offset)?)
    }

    /// Actions recorded by an actor, newest first. Restartable by offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn by_actor(
        &self,
        actor_id: &AdminId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>> {
        Ok(self.store.list_actions_by_actor(actor_id, limit, offset)?)
    }
}
