//! `RocksDB` storage implementation.
//!
//! Compound operations follow one shape: acquire the account's critical
//! section, read the committed state, validate the precondition, stage
//! every row into a single `WriteBatch`, commit. The batch is the unit of
//! durability; a validation failure commits nothing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use nocta_core::{
    Account, AccountId, AdminAction, AdminId, CreditTransaction, EntryDirection, Payout, PayoutId,
    PayoutStatus, TransactionId, TransactionKind, TransactionStatus,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::AccountLocks;
use crate::schema::{all_column_families, cf};
use crate::{PayoutSettlement, SettleOutcome, Store};

/// Default bound on lock acquisition before surfacing `Busy`.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: AccountLocks,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open with an explicit bound on per-account lock acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open_with_lock_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: AccountLocks::new(timeout),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_account_required(&self, account_id: &AccountId) -> Result<Account> {
        self.get_account(account_id)?.ok_or(StoreError::NotFound)
    }

    /// Apply a transaction's balance effect to an in-memory account record.
    ///
    /// Also maintains the lifetime counters: confirmed purchases bump
    /// `total_purchased` and stamp `last_purchase_at`, spend debits bump
    /// `total_spent`. The version increments on every application.
    fn apply_effect(account: &mut Account, transaction: &CreditTransaction) -> Result<()> {
        match transaction.direction {
            EntryDirection::Credit => {
                account.balance = account
                    .balance
                    .checked_add(transaction.amount)
                    .ok_or_else(|| StoreError::Integrity("balance overflow".into()))?;
            }
            EntryDirection::Debit => {
                account.balance = account.balance.checked_sub(transaction.amount).ok_or(
                    StoreError::InsufficientCredits {
                        balance: account.balance,
                        required: transaction.amount,
                    },
                )?;
            }
        }

        match transaction.kind {
            TransactionKind::Purchase => {
                account.total_purchased += transaction.amount;
                account.last_purchase_at = Some(chrono::Utc::now());
            }
            TransactionKind::Spend => {
                account.total_spent += transaction.amount;
            }
            _ => {}
        }

        account.version += 1;
        account.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Stage a transaction row plus its per-account index entry.
    fn stage_transaction(
        &self,
        batch: &mut WriteBatch,
        transaction: &CreditTransaction,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;

        let value = Self::serialize(transaction)?;
        batch.put_cf(&cf_tx, keys::transaction_key(&transaction.id), &value);
        batch.put_cf(
            &cf_by_account,
            keys::account_transaction_key(&transaction.account_id, &transaction.id),
            [],
        );

        if let Some(payment_ref) = &transaction.payment_ref {
            let cf_refs = self.cf(cf::PAYMENT_REFS)?;
            batch.put_cf(
                &cf_refs,
                keys::payment_ref_key(payment_ref),
                transaction.id.to_bytes(),
            );
        }

        Ok(())
    }

    /// Stage an updated transaction row (status move only; indexes are
    /// keyed by immutable fields and stay put).
    fn stage_transaction_update(
        &self,
        batch: &mut WriteBatch,
        transaction: &CreditTransaction,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let value = Self::serialize(transaction)?;
        batch.put_cf(&cf_tx, keys::transaction_key(&transaction.id), &value);
        Ok(())
    }

    fn stage_account(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let value = Self::serialize(account)?;
        batch.put_cf(&cf_accounts, keys::account_key(&account.id), &value);
        Ok(())
    }

    fn stage_payout(&self, batch: &mut WriteBatch, payout: &Payout, index: bool) -> Result<()> {
        let cf_payouts = self.cf(cf::PAYOUTS)?;
        let value = Self::serialize(payout)?;
        batch.put_cf(&cf_payouts, keys::payout_key(&payout.id), &value);
        if index {
            let cf_by_account = self.cf(cf::PAYOUTS_BY_ACCOUNT)?;
            batch.put_cf(
                &cf_by_account,
                keys::account_payout_key(&payout.account_id, &payout.id),
                [],
            );
        }
        Ok(())
    }

    /// Collect index keys under `prefix`, newest first, offset/limit applied.
    fn page_index_keys(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));

        // ULID suffixes sort oldest-first; collect and reverse for
        // newest-first paging.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        Ok(all_keys.into_iter().skip(offset).take(limit).collect())
    }

    fn get_payout_required(&self, payout_id: &PayoutId) -> Result<Payout> {
        self.get_payout(payout_id)?.ok_or(StoreError::NotFound)
    }

    /// Sum of reserving payout amounts, read through the payout index.
    /// Callers that need a consistent view hold the account lock.
    fn reserved_amount_inner(&self, account_id: &AccountId) -> Result<u64> {
        let prefix = keys::account_payouts_prefix(account_id);
        let keys = self.page_index_keys(cf::PAYOUTS_BY_ACCOUNT, &prefix, usize::MAX, 0)?;

        let mut reserved: u64 = 0;
        for key in keys {
            let payout_id = keys::extract_payout_id(&key);
            if let Some(payout) = self.get_payout(&payout_id)? {
                if payout.status.reserves_funds() {
                    reserved = reserved
                        .checked_add(payout.amount)
                        .ok_or_else(|| StoreError::Integrity("reservation overflow".into()))?;
                }
            }
        }
        Ok(reserved)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Accounts
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_account(&mut batch, account)?;
        self.write(batch)
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf, keys::account_key(account_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .get_cf(&cf, keys::transaction_key(transaction_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_by_payment_ref(&self, payment_ref: &str) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(cf::PAYMENT_REFS)?;
        let Some(id_bytes) = self
            .db
            .get_cf(&cf, keys::payment_ref_key(payment_ref))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if id_bytes.len() != 16 {
            return Err(StoreError::Integrity("malformed payment ref index".into()));
        }
        bytes.copy_from_slice(&id_bytes);
        let transaction_id = TransactionId::from_bytes(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.get_transaction(&transaction_id)
    }

    fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let prefix = keys::account_transactions_prefix(account_id);
        let page = self.page_index_keys(cf::TRANSACTIONS_BY_ACCOUNT, &prefix, limit, offset)?;

        let mut transactions = Vec::with_capacity(page.len());
        for key in page {
            let transaction_id = keys::extract_transaction_id(&key);
            if let Some(tx) = self.get_transaction(&transaction_id)? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    fn append_transaction(&self, transaction: &CreditTransaction) -> Result<u64> {
        if transaction.amount == 0 {
            return Err(StoreError::InvalidAmount);
        }
        if let Some(payment_ref) = &transaction.payment_ref {
            if self.find_by_payment_ref(payment_ref)?.is_some() {
                return Err(StoreError::DuplicatePaymentRef {
                    payment_ref: payment_ref.clone(),
                });
            }
        }

        match transaction.status {
            // Pending rows carry no balance effect; the row and its indexes
            // are still one batch.
            TransactionStatus::Pending => {
                let account = self.get_account_required(&transaction.account_id)?;

                let mut batch = WriteBatch::default();
                self.stage_transaction(&mut batch, transaction)?;
                self.write(batch)?;

                tracing::debug!(
                    transaction_id = %transaction.id,
                    account_id = %transaction.account_id,
                    amount = transaction.amount,
                    "Recorded pending transaction"
                );
                Ok(account.balance)
            }
            TransactionStatus::Completed => {
                let _guard = self.locks.acquire(transaction.account_id)?;

                let mut account = self.get_account_required(&transaction.account_id)?;
                Self::apply_effect(&mut account, transaction)?;

                let mut batch = WriteBatch::default();
                self.stage_transaction(&mut batch, transaction)?;
                self.stage_account(&mut batch, &account)?;
                self.write(batch)?;

                tracing::debug!(
                    transaction_id = %transaction.id,
                    account_id = %transaction.account_id,
                    kind = ?transaction.kind,
                    amount = transaction.amount,
                    balance = account.balance,
                    "Appended transaction"
                );
                Ok(account.balance)
            }
            status => Err(StoreError::Integrity(format!(
                "refusing to append transaction in terminal status {status:?}"
            ))),
        }
    }

    fn settle_transaction(
        &self,
        transaction_id: &TransactionId,
        outcome: SettleOutcome,
    ) -> Result<CreditTransaction> {
        let probe = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;

        let _guard = self.locks.acquire(probe.account_id)?;

        // Re-read under the lock: status moves only happen here.
        let mut transaction = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound)?;
        if transaction.status != TransactionStatus::Pending {
            return Err(StoreError::AlreadyProcessed {
                id: transaction.id.to_string(),
            });
        }

        let mut batch = WriteBatch::default();
        match outcome {
            SettleOutcome::Confirmed => {
                transaction.status = TransactionStatus::Completed;
                let mut account = self.get_account_required(&transaction.account_id)?;
                Self::apply_effect(&mut account, &transaction)?;
                self.stage_transaction_update(&mut batch, &transaction)?;
                self.stage_account(&mut batch, &account)?;
                self.write(batch)?;

                tracing::info!(
                    transaction_id = %transaction.id,
                    account_id = %transaction.account_id,
                    amount = transaction.amount,
                    balance = account.balance,
                    "Transaction confirmed"
                );
            }
            SettleOutcome::Failed => {
                transaction.status = TransactionStatus::Failed;
                self.stage_transaction_update(&mut batch, &transaction)?;
                self.write(batch)?;

                tracing::info!(
                    transaction_id = %transaction.id,
                    account_id = %transaction.account_id,
                    "Transaction failed, no balance effect"
                );
            }
        }

        Ok(transaction)
    }

    fn append_refund(&self, original_id: &TransactionId) -> Result<CreditTransaction> {
        let probe = self
            .get_transaction(original_id)?
            .ok_or(StoreError::NotFound)?;

        let _guard = self.locks.acquire(probe.account_id)?;

        let mut original = self
            .get_transaction(original_id)?
            .ok_or(StoreError::NotFound)?;
        match original.status {
            TransactionStatus::Completed => {}
            TransactionStatus::Refunded => {
                return Err(StoreError::AlreadyRefunded {
                    transaction_id: original.id.to_string(),
                })
            }
            status => {
                return Err(StoreError::InvalidTransition {
                    from: format!("{status:?}").to_lowercase(),
                    to: "refunded".into(),
                })
            }
        }

        let refund = CreditTransaction::refund_of(&original);
        let mut account = self.get_account_required(&original.account_id)?;
        Self::apply_effect(&mut account, &refund)?;

        original.status = TransactionStatus::Refunded;

        let mut batch = WriteBatch::default();
        self.stage_transaction_update(&mut batch, &original)?;
        self.stage_transaction(&mut batch, &refund)?;
        self.stage_account(&mut batch, &account)?;
        self.write(batch)?;

        tracing::info!(
            original_id = %original.id,
            refund_id = %refund.id,
            account_id = %account.id,
            amount = refund.amount,
            "Refund recorded"
        );
        Ok(refund)
    }

    fn append_transfer(
        &self,
        out_leg: &CreditTransaction,
        in_leg: &CreditTransaction,
    ) -> Result<(u64, u64)> {
        if out_leg.amount == 0 || out_leg.amount != in_leg.amount {
            return Err(StoreError::InvalidAmount);
        }
        if out_leg.account_id == in_leg.account_id
            || out_leg.kind != TransactionKind::TransferOut
            || in_leg.kind != TransactionKind::TransferIn
        {
            return Err(StoreError::Integrity("malformed transfer legs".into()));
        }

        let _guards = self
            .locks
            .acquire_pair(out_leg.account_id, in_leg.account_id)?;

        let mut from = self.get_account_required(&out_leg.account_id)?;
        let mut to = self.get_account_required(&in_leg.account_id)?;

        // Debit validated first; nothing is staged unless both succeed.
        Self::apply_effect(&mut from, out_leg)?;
        Self::apply_effect(&mut to, in_leg)?;

        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, out_leg)?;
        self.stage_transaction(&mut batch, in_leg)?;
        self.stage_account(&mut batch, &from)?;
        self.stage_account(&mut batch, &to)?;
        self.write(batch)?;

        tracing::info!(
            from = %from.id,
            to = %to.id,
            amount = out_leg.amount,
            "Transfer committed"
        );
        Ok((from.balance, to.balance))
    }

    // =========================================================================
    // Payouts
    // =========================================================================

    fn get_payout(&self, payout_id: &PayoutId) -> Result<Option<Payout>> {
        let cf = self.cf(cf::PAYOUTS)?;
        self.db
            .get_cf(&cf, keys::payout_key(payout_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_payouts(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Payout>> {
        let prefix = keys::account_payouts_prefix(account_id);
        let page = self.page_index_keys(cf::PAYOUTS_BY_ACCOUNT, &prefix, limit, offset)?;

        let mut payouts = Vec::with_capacity(page.len());
        for key in page {
            let payout_id = keys::extract_payout_id(&key);
            if let Some(payout) = self.get_payout(&payout_id)? {
                payouts.push(payout);
            }
        }
        Ok(payouts)
    }

    fn reserved_amount(&self, account_id: &AccountId) -> Result<u64> {
        self.reserved_amount_inner(account_id)
    }

    fn create_payout(&self, payout: &Payout) -> Result<()> {
        if payout.amount == 0 {
            return Err(StoreError::InvalidAmount);
        }
        if payout.status != PayoutStatus::Pending {
            return Err(StoreError::InvalidTransition {
                from: "new".into(),
                to: format!("{:?}", payout.status).to_lowercase(),
            });
        }

        let _guard = self.locks.acquire(payout.account_id)?;

        let account = self.get_account_required(&payout.account_id)?;
        let reserved = self.reserved_amount_inner(&payout.account_id)?;
        let available = account.balance.saturating_sub(reserved);
        if payout.amount > available {
            return Err(StoreError::InsufficientCredits {
                balance: available,
                required: payout.amount,
            });
        }

        let mut batch = WriteBatch::default();
        self.stage_payout(&mut batch, payout, true)?;
        self.write(batch)?;

        tracing::info!(
            payout_id = %payout.id,
            account_id = %payout.account_id,
            amount = payout.amount,
            available,
            "Payout requested"
        );
        Ok(())
    }

    fn approve_payout(&self, payout_id: &PayoutId) -> Result<Payout> {
        let probe = self.get_payout_required(payout_id)?;
        let _guard = self.locks.acquire(probe.account_id)?;

        let mut payout = self.get_payout_required(payout_id)?;
        match payout.status {
            PayoutStatus::Pending => {}
            PayoutStatus::Processing => {
                return Err(StoreError::AlreadyProcessed {
                    id: payout.id.to_string(),
                })
            }
            status => {
                return Err(StoreError::InvalidTransition {
                    from: format!("{status:?}").to_lowercase(),
                    to: "processing".into(),
                })
            }
        }

        // Re-validate at approval time: other reservations plus this payout
        // must still fit in the balance.
        let account = self.get_account_required(&payout.account_id)?;
        let reserved = self.reserved_amount_inner(&payout.account_id)?;
        let other_reserved = reserved.saturating_sub(payout.amount);
        let available = account.balance.saturating_sub(other_reserved);
        if payout.amount > available {
            return Err(StoreError::StaleBalance {
                available,
                requested: payout.amount,
            });
        }

        payout.status = PayoutStatus::Processing;

        let mut batch = WriteBatch::default();
        self.stage_payout(&mut batch, &payout, false)?;
        self.write(batch)?;

        tracing::info!(payout_id = %payout.id, account_id = %payout.account_id, "Payout approved");
        Ok(payout)
    }

    fn complete_payout(&self, payout_id: &PayoutId) -> Result<PayoutSettlement> {
        let probe = self.get_payout_required(payout_id)?;
        let _guard = self.locks.acquire(probe.account_id)?;

        let mut payout = self.get_payout_required(payout_id)?;
        match payout.status {
            PayoutStatus::Processing => {}
            PayoutStatus::Completed => {
                return Err(StoreError::AlreadyProcessed {
                    id: payout.id.to_string(),
                })
            }
            status => {
                return Err(StoreError::InvalidTransition {
                    from: format!("{status:?}").to_lowercase(),
                    to: "completed".into(),
                })
            }
        }

        let mut account = self.get_account_required(&payout.account_id)?;

        if account.balance < payout.amount {
            // The balance raced below the amount since approval. The payout
            // fails as one committed unit; the ledger is untouched.
            payout.status = PayoutStatus::Failed;
            payout.failure_reason = Some("insufficient balance at completion".into());

            let mut batch = WriteBatch::default();
            self.stage_payout(&mut batch, &payout, false)?;
            self.write(batch)?;

            tracing::warn!(
                payout_id = %payout.id,
                account_id = %payout.account_id,
                balance = account.balance,
                amount = payout.amount,
                "Payout auto-failed on stale balance"
            );
            return Ok(PayoutSettlement::InsufficientBalance {
                payout,
                balance: account.balance,
            });
        }

        let debit = CreditTransaction::payout_debit(payout.account_id, payout.amount, payout.id);
        Self::apply_effect(&mut account, &debit)?;

        payout.status = PayoutStatus::Completed;
        payout.processed_at = Some(chrono::Utc::now());

        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, &debit)?;
        self.stage_account(&mut batch, &account)?;
        self.stage_payout(&mut batch, &payout, false)?;
        self.write(batch)?;

        tracing::info!(
            payout_id = %payout.id,
            account_id = %payout.account_id,
            amount = payout.amount,
            balance = account.balance,
            "Payout completed"
        );
        Ok(PayoutSettlement::Completed { payout, debit })
    }

    fn fail_payout(&self, payout_id: &PayoutId, reason: &str) -> Result<Payout> {
        let probe = self.get_payout_required(payout_id)?;
        let _guard = self.locks.acquire(probe.account_id)?;

        let mut payout = self.get_payout_required(payout_id)?;
        match payout.status {
            PayoutStatus::Pending | PayoutStatus::Processing => {}
            PayoutStatus::Failed => {
                return Err(StoreError::AlreadyProcessed {
                    id: payout.id.to_string(),
                })
            }
            PayoutStatus::Completed => {
                return Err(StoreError::InvalidTransition {
                    from: "completed".into(),
                    to: "failed".into(),
                })
            }
        }

        payout.status = PayoutStatus::Failed;
        payout.failure_reason = Some(reason.to_string());

        let mut batch = WriteBatch::default();
        self.stage_payout(&mut batch, &payout, false)?;
        self.write(batch)?;

        tracing::info!(payout_id = %payout.id, reason, "Payout failed");
        Ok(payout)
    }

    // =========================================================================
    // Audit trail
    // =========================================================================

    fn append_action(&self, action: &AdminAction) -> Result<()> {
        let cf_actions = self.cf(cf::ADMIN_ACTIONS)?;
        let cf_by_target = self.cf(cf::ACTIONS_BY_TARGET)?;
        let cf_by_actor = self.cf(cf::ACTIONS_BY_ACTOR)?;

        let value = Self::serialize(action)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_actions, keys::action_key(&action.id), &value);
        batch.put_cf(
            &cf_by_target,
            keys::target_action_key(&action.target_id, &action.id),
            [],
        );
        batch.put_cf(
            &cf_by_actor,
            keys::actor_action_key(&action.actor_id, &action.id),
            [],
        );
        self.write(batch)
    }

    fn list_actions_by_target(
        &self,
        target_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>> {
        let prefix = keys::target_actions_prefix(target_id);
        let page = self.page_index_keys(cf::ACTIONS_BY_TARGET, &prefix, limit, offset)?;
        self.load_actions(page)
    }

    fn list_actions_by_actor(
        &self,
        actor_id: &AdminId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminAction>> {
        let prefix = keys::actor_actions_prefix(actor_id);
        let page = self.page_index_keys(cf::ACTIONS_BY_ACTOR, &prefix, limit, offset)?;
        self.load_actions(page)
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    fn recompute_balance(&self, account_id: &AccountId) -> Result<u64> {
        let prefix = keys::account_transactions_prefix(account_id);
        let all = self.page_index_keys(cf::TRANSACTIONS_BY_ACCOUNT, &prefix, usize::MAX, 0)?;

        let mut balance: i128 = 0;
        for key in all {
            let transaction_id = keys::extract_transaction_id(&key);
            let Some(tx) = self.get_transaction(&transaction_id)? else {
                continue;
            };
            if !tx.is_effective() {
                continue;
            }
            match tx.direction {
                EntryDirection::Credit => balance += i128::from(tx.amount),
                EntryDirection::Debit => balance -= i128::from(tx.amount),
            }
        }

        u64::try_from(balance)
            .map_err(|_| StoreError::Integrity(format!("log folds to negative: {balance}")))
    }

    fn verify_account(&self, account_id: &AccountId) -> Result<()> {
        let account = self.get_account_required(account_id)?;
        let derived = self.recompute_balance(account_id)?;
        if derived == account.balance {
            Ok(())
        } else {
            Err(StoreError::Integrity(format!(
                "cached balance {} diverges from log fold {} for account {}",
                account.balance, derived, account.id
            )))
        }
    }
}

impl RocksStore {
    fn load_actions(&self, page: Vec<Vec<u8>>) -> Result<Vec<AdminAction>> {
        let cf = self.cf(cf::ADMIN_ACTIONS)?;
        let mut actions = Vec::with_capacity(page.len());
        for key in page {
            let action_id = keys::extract_action_id(&key);
            if let Some(data) = self
                .db
                .get_cf(&cf, keys::action_key(&action_id))
                .map_err(|e| StoreError::Database(e.to_string()))?
            {
                actions.push(Self::deserialize(&data)?);
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nocta_core::{AccountKind, AdminActionKind, PayoutMethod};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn account_with_balance(store: &RocksStore, balance: u64) -> AccountId {
        let account = Account::new(AccountId::generate(), AccountKind::User);
        store.put_account(&account).unwrap();
        if balance > 0 {
            let grant = CreditTransaction::admin_adjustment(
                account.id,
                balance,
                EntryDirection::Credit,
                "test grant".into(),
            );
            store.append_transaction(&grant).unwrap();
        }
        account.id
    }

    #[test]
    fn account_roundtrip() {
        let (store, _dir) = create_test_store();
        let account = Account::new(AccountId::generate(), AccountKind::Club);
        store.put_account(&account).unwrap();

        let retrieved = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(retrieved.balance, 0);
        assert_eq!(retrieved.kind, AccountKind::Club);
    }

    #[test]
    fn append_spend_updates_balance_and_version() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 1000);

        let spend = CreditTransaction::spend(account_id, 300, "boost".into());
        let balance = store.append_transaction(&spend).unwrap();
        assert_eq!(balance, 700);

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 700);
        assert_eq!(account.total_spent, 300);
        assert_eq!(account.version, 2); // grant + spend
    }

    #[test]
    fn spend_beyond_balance_is_rejected() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 100);

        let spend = CreditTransaction::spend(account_id, 200, "boost".into());
        let result = store.append_transaction(&spend);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCredits {
                balance: 100,
                required: 200
            })
        ));

        // Nothing committed.
        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 100);
        assert_eq!(store.list_transactions(&account_id, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 100);

        let spend = CreditTransaction::spend(account_id, 0, "noop".into());
        assert!(matches!(
            store.append_transaction(&spend),
            Err(StoreError::InvalidAmount)
        ));
    }

    #[test]
    fn pending_purchase_has_no_effect_until_confirmed() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 0);

        let purchase =
            CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_1".into());
        let balance = store.append_transaction(&purchase).unwrap();
        assert_eq!(balance, 0);

        let settled = store
            .settle_transaction(&purchase.id, SettleOutcome::Confirmed)
            .unwrap();
        assert_eq!(settled.status, TransactionStatus::Completed);

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 500);
        assert_eq!(account.total_purchased, 500);
        assert!(account.last_purchase_at.is_some());
    }

    #[test]
    fn settle_is_idempotent() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 0);

        let purchase =
            CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_2".into());
        store.append_transaction(&purchase).unwrap();
        store
            .settle_transaction(&purchase.id, SettleOutcome::Confirmed)
            .unwrap();

        let second = store.settle_transaction(&purchase.id, SettleOutcome::Confirmed);
        assert!(matches!(second, Err(StoreError::AlreadyProcessed { .. })));

        // Balance credited exactly once.
        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 500);
    }

    #[test]
    fn failed_purchase_never_credits() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 0);

        let purchase =
            CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_3".into());
        store.append_transaction(&purchase).unwrap();
        let settled = store
            .settle_transaction(&purchase.id, SettleOutcome::Failed)
            .unwrap();
        assert_eq!(settled.status, TransactionStatus::Failed);

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.total_purchased, 0);
    }

    #[test]
    fn duplicate_payment_ref_is_rejected() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 0);

        let first = CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_4".into());
        store.append_transaction(&first).unwrap();

        let second = CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_4".into());
        assert!(matches!(
            store.append_transaction(&second),
            Err(StoreError::DuplicatePaymentRef { .. })
        ));
    }

    #[test]
    fn refund_inverts_and_marks_original() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 500);

        let spend = CreditTransaction::spend(account_id, 200, "boost".into());
        store.append_transaction(&spend).unwrap();
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().balance, 300);

        let refund = store.append_refund(&spend.id).unwrap();
        assert_eq!(refund.direction, EntryDirection::Credit);
        assert_eq!(refund.linked_tx, Some(spend.id));

        let original = store.get_transaction(&spend.id).unwrap().unwrap();
        assert_eq!(original.status, TransactionStatus::Refunded);
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().balance, 500);
    }

    #[test]
    fn refund_twice_yields_already_refunded() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 500);

        let spend = CreditTransaction::spend(account_id, 200, "boost".into());
        store.append_transaction(&spend).unwrap();

        store.append_refund(&spend.id).unwrap();
        let second = store.append_refund(&spend.id);
        assert!(matches!(second, Err(StoreError::AlreadyRefunded { .. })));

        // Exactly one refund row, balance restored exactly once.
        let transactions = store.list_transactions(&account_id, 10, 0).unwrap();
        let refunds: Vec<_> = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Refund)
            .collect();
        assert_eq!(refunds.len(), 1);
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().balance, 500);
    }

    #[test]
    fn refund_of_pending_is_invalid() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 0);

        let purchase =
            CreditTransaction::purchase(account_id, 500, "starter".into(), "pay_5".into());
        store.append_transaction(&purchase).unwrap();

        assert!(matches!(
            store.append_refund(&purchase.id),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn transfer_moves_exactly_amount() {
        let (store, _dir) = create_test_store();
        let from = account_with_balance(&store, 500);
        let to = account_with_balance(&store, 100);

        let (out_leg, in_leg) =
            CreditTransaction::transfer_pair(from, to, 150, None, "gift".into());
        let (from_balance, to_balance) = store.append_transfer(&out_leg, &in_leg).unwrap();

        assert_eq!(from_balance, 350);
        assert_eq!(to_balance, 250);
        store.verify_account(&from).unwrap();
        store.verify_account(&to).unwrap();
    }

    #[test]
    fn failed_transfer_leaves_both_untouched() {
        let (store, _dir) = create_test_store();
        let from = account_with_balance(&store, 100);
        let to = account_with_balance(&store, 0);

        let (out_leg, in_leg) =
            CreditTransaction::transfer_pair(from, to, 150, None, "gift".into());
        let result = store.append_transfer(&out_leg, &in_leg);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCredits { .. })
        ));

        assert_eq!(store.get_account(&from).unwrap().unwrap().balance, 100);
        assert_eq!(store.get_account(&to).unwrap().unwrap().balance, 0);
        // Neither leg is visible.
        assert_eq!(store.list_transactions(&to, 10, 0).unwrap().len(), 0);
    }

    #[test]
    fn list_transactions_newest_first_with_offset() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 1000);

        for i in 0..3 {
            std::thread::sleep(std::time::Duration::from_millis(2)); // distinct ULID timestamps
            let spend = CreditTransaction::spend(account_id, 10, format!("spend {i}"));
            store.append_transaction(&spend).unwrap();
        }

        let all = store.list_transactions(&account_id, 10, 0).unwrap();
        assert_eq!(all.len(), 4); // grant + 3 spends
        assert_eq!(all[0].description, "spend 2");
        assert_eq!(all[1].description, "spend 1");

        let page = store.list_transactions(&account_id, 2, 1).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].description, "spend 1");
        assert_eq!(page[1].description, "spend 0");
    }

    #[test]
    fn payout_reservation_blocks_over_request() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 300);

        let first = Payout::new(account_id, 200, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&first).unwrap();
        assert_eq!(store.reserved_amount(&account_id).unwrap(), 200);

        // 200 reserved, only 100 available.
        let second = Payout::new(account_id, 150, PayoutMethod::BankTransfer, "iban".into());
        assert!(matches!(
            store.create_payout(&second),
            Err(StoreError::InsufficientCredits {
                balance: 100,
                required: 150
            })
        ));
    }

    #[test]
    fn payout_lifecycle_completes_with_debit() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 500);

        let payout = Payout::new(account_id, 200, PayoutMethod::Paypal, "x@y.z".into());
        store.create_payout(&payout).unwrap();

        let approved = store.approve_payout(&payout.id).unwrap();
        assert_eq!(approved.status, PayoutStatus::Processing);

        let settlement = store.complete_payout(&payout.id).unwrap();
        let PayoutSettlement::Completed { payout, debit } = settlement else {
            panic!("expected completion");
        };
        assert_eq!(payout.status, PayoutStatus::Completed);
        assert!(payout.processed_at.is_some());
        assert_eq!(debit.kind, TransactionKind::Payout);
        assert_eq!(debit.amount, 200);

        let account = store.get_account(&account_id).unwrap().unwrap();
        assert_eq!(account.balance, 300);
        store.verify_account(&account_id).unwrap();
    }

    #[test]
    fn approve_after_spend_is_stale() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 100);

        let payout = Payout::new(account_id, 100, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&payout).unwrap();

        // A spend wins the race before approval.
        let spend = CreditTransaction::spend(account_id, 50, "boost".into());
        store.append_transaction(&spend).unwrap();

        let result = store.approve_payout(&payout.id);
        assert!(matches!(
            result,
            Err(StoreError::StaleBalance {
                available: 50,
                requested: 100
            })
        ));
        // Still pending, admin can fail it explicitly.
        assert_eq!(
            store.get_payout(&payout.id).unwrap().unwrap().status,
            PayoutStatus::Pending
        );
    }

    #[test]
    fn complete_auto_fails_on_raced_balance() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 200);

        let payout = Payout::new(account_id, 200, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&payout).unwrap();
        store.approve_payout(&payout.id).unwrap();

        // Spend sneaks in between approval and completion.
        let spend = CreditTransaction::spend(account_id, 150, "boost".into());
        store.append_transaction(&spend).unwrap();

        let settlement = store.complete_payout(&payout.id).unwrap();
        let PayoutSettlement::InsufficientBalance { payout, balance } = settlement else {
            panic!("expected auto-fail");
        };
        assert_eq!(payout.status, PayoutStatus::Failed);
        assert_eq!(balance, 50);
        assert!(payout.processed_at.is_none());

        // No debit was recorded.
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().balance, 50);
        store.verify_account(&account_id).unwrap();
    }

    #[test]
    fn fail_payout_requires_no_completed_state() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 500);

        let payout = Payout::new(account_id, 100, PayoutMethod::Crypto, "0xabc".into());
        store.create_payout(&payout).unwrap();
        store.approve_payout(&payout.id).unwrap();
        store.complete_payout(&payout.id).unwrap();

        assert!(matches!(
            store.fail_payout(&payout.id, "too late"),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn failed_payout_releases_reservation() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 300);

        let payout = Payout::new(account_id, 200, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&payout).unwrap();
        store.fail_payout(&payout.id, "bank details rejected").unwrap();

        assert_eq!(store.reserved_amount(&account_id).unwrap(), 0);

        // The full balance is requestable again.
        let next = Payout::new(account_id, 300, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&next).unwrap();
    }

    #[test]
    fn concurrent_spends_never_overdraw() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let account_id = account_with_balance(&store, 500);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let spend = CreditTransaction::spend(account_id, 100, "race".into());
                store.append_transaction(&spend)
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => successes += 1,
                Err(StoreError::InsufficientCredits { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 5); // 500 / 100
        assert_eq!(insufficient, 3);
        assert_eq!(store.get_account(&account_id).unwrap().unwrap().balance, 0);
        store.verify_account(&account_id).unwrap();
    }

    #[test]
    fn concurrent_payout_requests_respect_reservation() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let account_id = account_with_balance(&store, 500);

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let payout =
                    Payout::new(account_id, 200, PayoutMethod::BankTransfer, "iban".into());
                store.create_payout(&payout)
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();

        // 2 * 200 <= 500 < 3 * 200: exactly two requests may be admitted.
        assert_eq!(successes, 2);
        assert_eq!(store.reserved_amount(&account_id).unwrap(), 400);
    }

    #[test]
    fn verify_detects_tampered_balance() {
        let (store, _dir) = create_test_store();
        let account_id = account_with_balance(&store, 500);
        store.verify_account(&account_id).unwrap();

        // Write a divergent cached balance behind the ledger's back.
        let mut account = store.get_account(&account_id).unwrap().unwrap();
        account.balance = 9999;
        store.put_account(&account).unwrap();

        assert!(matches!(
            store.verify_account(&account_id),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn audit_actions_listed_by_target_and_actor() {
        let (store, _dir) = create_test_store();
        let actor = AdminId::generate();

        for i in 0..3 {
            std::thread::sleep(std::time::Duration::from_millis(2));
            let action = AdminAction::new(
                actor,
                AdminActionKind::CreditAdjustment,
                "account-1".into(),
                Some(format!("reason {i}")),
                None,
            );
            store.append_action(&action).unwrap();
        }
        let other = AdminAction::new(
            AdminId::generate(),
            AdminActionKind::PayoutApproved,
            "payout-1".into(),
            None,
            None,
        );
        store.append_action(&other).unwrap();

        let by_target = store.list_actions_by_target("account-1", 10, 0).unwrap();
        assert_eq!(by_target.len(), 3);
        assert_eq!(by_target[0].reason.as_deref(), Some("reason 2")); // newest first

        let by_actor = store.list_actions_by_actor(&actor, 2, 1).unwrap();
        assert_eq!(by_actor.len(), 2);
        assert_eq!(by_actor[0].reason.as_deref(), Some("reason 1"));

        let unrelated = store.list_actions_by_target("account-10", 10, 0).unwrap();
        assert!(unrelated.is_empty());
    }
}
