//! Transaction processing.
//!
//! Validates and orchestrates the operations that touch the ledger. The
//! store enforces atomicity; this layer enforces the business rules around
//! it and keeps gateway round-trips strictly outside the account critical
//! sections: a purchase talks to the gateway first, then records the
//! pending row, and is credited only when the gateway's callback arrives.

use std::sync::Arc;

use nocta_core::{
    AccountId, AdminActionKind, AdminId, CreditTransaction, EarningSource, EntryDirection,
    PackageCatalog, TransactionId, TransactionKind,
};
use nocta_store::{SettleOutcome, Store};

use crate::audit::AuditTrail;
use crate::error::{LedgerError, Result};
use crate::gateway::{PaymentGateway, PaymentRequest};

/// Orchestrates purchases, spends, transfers, refunds and adjustments.
pub struct TransactionProcessor<S> {
    store: Arc<S>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: PackageCatalog,
    audit: AuditTrail<S>,
}

/// The result of initiating a purchase: a pending transaction awaiting the
/// gateway's confirmation callback.
#[derive(Debug, Clone)]
pub struct PurchaseIntent {
    /// The pending ledger entry.
    pub transaction_id: TransactionId,
    /// The gateway's payment reference.
    pub payment_ref: String,
    /// Credits that will be granted on confirmation.
    pub credits_amount: u64,
    /// Price charged, in euro cents.
    pub price_cents: u64,
}

impl<S: Store> TransactionProcessor<S> {
    /// Create a processor over the given store, gateway and catalog.
    #[must_use]
    pub fn new(store: Arc<S>, gateway: Arc<dyn PaymentGateway>, catalog: PackageCatalog) -> Self {
        let audit = AuditTrail::new(Arc::clone(&store));
        Self {
            store,
            gateway,
            catalog,
            audit,
        }
    }

    /// The package catalog on offer.
    #[must_use]
    pub fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    /// Initiate a credit purchase.
    ///
    /// Validates the package, runs the gateway round-trip (no lock held),
    /// then records a `pending` purchase carrying the gateway's payment
    /// reference. Nothing is credited until the confirmation callback.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown account or inactive package.
    /// - `LedgerError::Gateway` if the collaborator rejects or fails.
    pub async fn purchase(&self, account_id: AccountId, package_id: &str) -> Result<PurchaseIntent> {
        let package = self
            .catalog
            .get_active(package_id)
            .ok_or_else(|| LedgerError::NotFound(format!("package {package_id}")))?
            .clone();

        self.store
            .get_account(&account_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;

        self.gateway
            .validate_amount(package.price_cents)
            .await
            .map_err(|e| LedgerError::Gateway(e.to_string()))?;

        let payment_ref = self
            .gateway
            .initiate_payment(&PaymentRequest {
                account_id,
                package_id: package.id.clone(),
                amount_cents: package.price_cents,
                credits_amount: package.credits_amount,
            })
            .await
            .map_err(|e| LedgerError::Gateway(e.to_string()))?;

        let transaction = CreditTransaction::purchase(
            account_id,
            package.credits_amount,
            package.id.clone(),
            payment_ref.clone(),
        );
        self.store.append_transaction(&transaction)?;

        tracing::info!(
            transaction_id = %transaction.id,
            account_id = %account_id,
            package_id = %package.id,
            payment_ref = %payment_ref,
            "Purchase initiated"
        );
        Ok(PurchaseIntent {
            transaction_id: transaction.id,
            payment_ref,
            credits_amount: package.credits_amount,
            price_cents: package.price_cents,
        })
    }

    /// Gateway callback: the payment went through. Credits the pending
    /// purchase. Redelivery of the same callback reports
    /// `AlreadyProcessed` without a second credit.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown payment reference.
    /// - `LedgerError::AlreadyProcessed` if the purchase was already settled.
    pub fn on_payment_confirmed(&self, payment_ref: &str) -> Result<CreditTransaction> {
        let transaction = self
            .store
            .find_by_payment_ref(payment_ref)?
            .ok_or_else(|| LedgerError::NotFound(format!("payment ref {payment_ref}")))?;

        let settled = self
            .store
            .settle_transaction(&transaction.id, SettleOutcome::Confirmed)?;

        tracing::info!(
            transaction_id = %settled.id,
            account_id = %settled.account_id,
            amount = settled.amount,
            "Payment confirmed, credits granted"
        );
        Ok(settled)
    }

    /// Gateway callback: the payment failed. The pending purchase becomes
    /// terminal with no balance effect.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown payment reference.
    /// - `LedgerError::AlreadyProcessed` if the purchase was already settled.
    pub fn on_payment_failed(&self, payment_ref: &str) -> Result<CreditTransaction> {
        let transaction = self
            .store
            .find_by_payment_ref(payment_ref)?
            .ok_or_else(|| LedgerError::NotFound(format!("payment ref {payment_ref}")))?;

        let settled = self
            .store
            .settle_transaction(&transaction.id, SettleOutcome::Failed)?;

        tracing::info!(
            transaction_id = %settled.id,
            account_id = %settled.account_id,
            "Payment failed, purchase voided"
        );
        Ok(settled)
    }

    /// Cancel a purchase that was never confirmed. Side-effect-free: the
    /// pending row becomes `failed`, nothing was ever credited.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown transaction.
    /// - `LedgerError::Validation` if the transaction is not a purchase.
    /// - `LedgerError::AlreadyProcessed` if it was already settled.
    pub fn cancel_purchase(&self, transaction_id: &TransactionId) -> Result<CreditTransaction> {
        let transaction = self
            .store
            .get_transaction(transaction_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {transaction_id}")))?;
        if transaction.kind != TransactionKind::Purchase {
            return Err(LedgerError::Validation(
                "only purchases can be cancelled".into(),
            ));
        }

        Ok(self
            .store
            .settle_transaction(transaction_id, SettleOutcome::Failed)?)
    }

    /// Spend credits. Appends a completed `spend` debit or fails with
    /// `InsufficientCredits`; never partially applied, never auto-retried.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` for a zero amount.
    /// - `LedgerError::InsufficientCredits` if the balance doesn't cover it.
    /// - `LedgerError::Busy` on lock contention.
    pub fn spend(
        &self,
        account_id: AccountId,
        amount: u64,
        description: &str,
    ) -> Result<CreditTransaction> {
        if amount == 0 {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }

        let transaction = CreditTransaction::spend(account_id, amount, description.to_string());
        let balance = self.store.append_transaction(&transaction)?;

        tracing::info!(
            transaction_id = %transaction.id,
            account_id = %account_id,
            amount,
            balance,
            "Credits spent"
        );
        Ok(transaction)
    }

    /// Transfer credits between two accounts as one atomic unit. The
    /// receiving leg carries the optional earning-source tag (gifts,
    /// fan-post earnings).
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` for a zero amount or self-transfer.
    /// - `LedgerError::InsufficientCredits` if the source can't cover it.
    /// - `LedgerError::Busy` on lock contention.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: u64,
        source: Option<EarningSource>,
        description: &str,
    ) -> Result<(CreditTransaction, CreditTransaction)> {
        if amount == 0 {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if from == to {
            return Err(LedgerError::Validation(
                "cannot transfer to the same account".into(),
            ));
        }

        let (out_leg, in_leg) =
            CreditTransaction::transfer_pair(from, to, amount, source, description.to_string());
        self.store.append_transfer(&out_leg, &in_leg)?;
        Ok((out_leg, in_leg))
    }

    /// Refund a completed transaction with an inverse-effect entry.
    /// Idempotent: a second call reports `AlreadyRefunded` and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for an unknown transaction.
    /// - `LedgerError::AlreadyRefunded` on the second call.
    /// - `LedgerError::InvalidTransition` if the original never completed.
    pub fn refund(&self, original_id: &TransactionId) -> Result<CreditTransaction> {
        Ok(self.store.append_refund(original_id)?)
    }

    /// Privileged balance correction. Completes immediately and is always
    /// recorded in the audit trail; the reason is mandatory.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` for a zero amount or empty reason.
    /// - `LedgerError::InsufficientCredits` for a debit beyond the balance.
    pub fn admin_adjustment(
        &self,
        account_id: AccountId,
        amount: u64,
        direction: EntryDirection,
        reason: &str,
        admin_id: AdminId,
    ) -> Result<CreditTransaction> {
        if amount == 0 {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "a reason is required for adjustments".into(),
            ));
        }

        let transaction =
            CreditTransaction::admin_adjustment(account_id, amount, direction, reason.to_string());
        let balance = self.store.append_transaction(&transaction)?;

        self.audit.record(
            admin_id,
            AdminActionKind::CreditAdjustment,
            account_id.to_string(),
            Some(reason.to_string()),
            Some(format!("{direction:?} {amount} credits, balance now {balance}")),
        )?;

        Ok(transaction)
    }

    /// The audit trail this processor records into.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail<S> {
        &self.audit
    }
}
