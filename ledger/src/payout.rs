//! Payout workflow.
//!
//! The payout state machine: account holders request, admins approve,
//! complete or fail. Requesting earmarks funds through the reservation
//! invariant (pending + processing payout amounts never exceed the
//! balance); the ledger is debited only at completion, atomically with the
//! `processing -> completed` move.

use std::sync::Arc;

use nocta_core::{AccountId, AdminActionKind, AdminId, Payout, PayoutId, PayoutMethod};
use nocta_store::{PayoutSettlement, Store};

use crate::audit::AuditTrail;
use crate::error::{LedgerError, Result};

/// Admin-mediated payout lifecycle on top of the store's atomic
/// transitions.
pub struct PayoutWorkflow<S> {
    store: Arc<S>,
    audit: AuditTrail<S>,
}

impl<S: Store> PayoutWorkflow<S> {
    /// Create a workflow over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let audit = AuditTrail::new(Arc::clone(&store));
        Self { store, audit }
    }

    /// Request a payout. The amount is checked against the withdrawable
    /// balance (`balance - reserved`) under the account lock, so
    /// concurrent requests cannot jointly exceed the balance. The ledger
    /// is not debited yet.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` for a zero amount or empty details.
    /// - `LedgerError::NotFound` for an unknown account.
    /// - `LedgerError::InsufficientCredits` if the withdrawable balance
    ///   doesn't cover the amount.
    pub fn request(
        &self,
        account_id: AccountId,
        amount: u64,
        method: PayoutMethod,
        details: &str,
    ) -> Result<Payout> {
        if amount == 0 {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if details.trim().is_empty() {
            return Err(LedgerError::Validation(
                "payout details are required".into(),
            ));
        }
        self.store
            .get_account(&account_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;

        let payout = Payout::new(account_id, amount, method, details.to_string());
        self.store.create_payout(&payout)?;
        Ok(payout)
    }

    /// Approve a pending payout (`pending -> processing`). The available
    /// balance is re-validated; a raced balance surfaces `StaleBalance`
    /// and leaves the payout pending for the admin to fail explicitly.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown payout.
    /// - `LedgerError::StaleBalance` if the balance no longer covers it.
    /// - `LedgerError::AlreadyProcessed` if it is already processing.
    /// - `LedgerError::InvalidTransition` from a terminal state.
    pub fn approve(&self, payout_id: &PayoutId, admin_id: AdminId) -> Result<Payout> {
        let payout = self.store.approve_payout(payout_id)?;
        self.audit.record(
            admin_id,
            AdminActionKind::PayoutApproved,
            payout_id.to_string(),
            None,
            None,
        )?;
        Ok(payout)
    }

    /// Complete a processing payout: the `payout` debit and the
    /// `processing -> completed` move commit as one unit. If the balance
    /// raced below the amount the payout auto-fails (committed) and
    /// `StaleBalance` is surfaced so the admin is notified.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown payout.
    /// - `LedgerError::StaleBalance` if the payout auto-failed.
    /// - `LedgerError::AlreadyProcessed` if it already completed.
    /// - `LedgerError::InvalidTransition` if it was never approved.
    pub fn complete(&self, payout_id: &PayoutId, admin_id: AdminId) -> Result<Payout> {
        match self.store.complete_payout(payout_id)? {
            PayoutSettlement::Completed { payout, debit } => {
                self.audit.record(
                    admin_id,
                    AdminActionKind::PayoutCompleted,
                    payout_id.to_string(),
                    None,
                    Some(format!("ledger debit {}", debit.id)),
                )?;
                Ok(payout)
            }
            PayoutSettlement::InsufficientBalance { payout, balance } => {
                self.audit.record(
                    admin_id,
                    AdminActionKind::PayoutFailed,
                    payout_id.to_string(),
                    Some("insufficient balance at completion".into()),
                    None,
                )?;
                Err(LedgerError::StaleBalance {
                    available: balance,
                    requested: payout.amount,
                })
            }
        }
    }

    /// Fail a pending or processing payout. The reason is mandatory; there
    /// is no ledger effect, and the reservation is released.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` for an empty reason.
    /// - `LedgerError::NotFound` for an unknown payout.
    /// - `LedgerError::AlreadyProcessed` if it already failed.
    /// - `LedgerError::InvalidTransition` if it already completed.
    pub fn fail(&self, payout_id: &PayoutId, admin_id: AdminId, reason: &str) -> Result<Payout> {
        if reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "a reason is required to fail a payout".into(),
            ));
        }

        let payout = self.store.fail_payout(payout_id, reason)?;
        self.audit.record(
            admin_id,
            AdminActionKind::PayoutFailed,
            payout_id.to_string(),
            Some(reason.to_string()),
            None,
        )?;
        Ok(payout)
    }
}
