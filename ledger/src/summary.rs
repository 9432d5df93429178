//! Read-only dashboard projections.
//!
//! Summaries fold the committed transaction log and payout set on demand;
//! nothing is stored. The store commits every mutation as one batch, so a
//! projection never observes a partially-applied write.

use std::sync::Arc;

use nocta_core::{
    AccountId, ClubCreditSummary, EarningSource, EarningsSummary, EntryDirection, TransactionKind,
};
use nocta_store::Store;

use crate::error::{LedgerError, Result};

/// Page size for log scans.
const SCAN_PAGE: usize = 500;

/// Computes rollups from committed ledger state.
pub struct SummaryAggregator<S> {
    store: Arc<S>,
}

impl<S: Store> SummaryAggregator<S> {
    /// Create an aggregator over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn fold_transactions<F>(&self, account_id: &AccountId, mut f: F) -> Result<()>
    where
        F: FnMut(&nocta_core::CreditTransaction),
    {
        let mut offset = 0;
        loop {
            let page = self.store.list_transactions(account_id, SCAN_PAGE, offset)?;
            let n = page.len();
            for tx in &page {
                f(tx);
            }
            if n < SCAN_PAGE {
                return Ok(());
            }
            offset += n;
        }
    }

    /// Credit overview for a club dashboard.
    ///
    /// `available_for_withdrawal = balance - pending_withdrawals`, where
    /// pending withdrawals are the reserved (pending + processing) payout
    /// amounts.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown account.
    pub fn club_credit_summary(&self, club_id: &AccountId) -> Result<ClubCreditSummary> {
        let account = self
            .store
            .get_account(club_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("account {club_id}")))?;

        let mut total_earned: u64 = 0;
        let mut total_spent: u64 = 0;
        self.fold_transactions(club_id, |tx| {
            if !tx.is_effective() {
                return;
            }
            match tx.direction {
                EntryDirection::Credit => total_earned += tx.amount,
                EntryDirection::Debit => {
                    if tx.kind == TransactionKind::Spend {
                        total_spent += tx.amount;
                    }
                }
            }
        })?;

        let pending_withdrawals = self.store.reserved_amount(club_id)?;
        Ok(ClubCreditSummary {
            balance: account.balance,
            total_earned,
            total_spent,
            pending_withdrawals,
            available_for_withdrawal: account.balance.saturating_sub(pending_withdrawals),
        })
    }

    /// Earnings breakdown for a creator dashboard, categorized by the
    /// earning-source tag on received credits.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown account.
    pub fn earnings_summary(&self, account_id: &AccountId) -> Result<EarningsSummary> {
        let account = self
            .store
            .get_account(account_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;

        let mut credits_from_gifts: u64 = 0;
        let mut credits_from_fanposts: u64 = 0;
        let mut credits_payouts: u64 = 0;
        self.fold_transactions(account_id, |tx| {
            if !tx.is_effective() {
                return;
            }
            match (tx.kind, tx.source) {
                (TransactionKind::Payout, _) => credits_payouts += tx.amount,
                (_, Some(EarningSource::Gift)) => credits_from_gifts += tx.amount,
                (_, Some(EarningSource::FanPost)) => credits_from_fanposts += tx.amount,
                _ => {}
            }
        })?;

        let reserved = self.store.reserved_amount(account_id)?;

        // Last payout: newest completed payout's processing time.
        let mut last_payout_at = None;
        let mut offset = 0;
        loop {
            let page = self.store.list_payouts(account_id, SCAN_PAGE, offset)?;
            let n = page.len();
            for payout in &page {
                if let Some(processed_at) = payout.processed_at {
                    if last_payout_at.map_or(true, |t| processed_at > t) {
                        last_payout_at = Some(processed_at);
                    }
                }
            }
            if n < SCAN_PAGE {
                break;
            }
            offset += n;
        }

        Ok(EarningsSummary {
            credits_from_gifts,
            credits_from_fanposts,
            credits_payouts,
            credits_available: account.balance.saturating_sub(reserved),
            last_payout_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nocta_core::{
        Account, AccountKind, CreditTransaction, Payout, PayoutMethod, PayoutStatus,
    };
    use nocta_store::{PayoutSettlement, RocksStore};
    use tempfile::TempDir;

    fn setup() -> (SummaryAggregator<RocksStore>, Arc<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let aggregator = SummaryAggregator::new(Arc::clone(&store));
        (aggregator, store, dir)
    }

    fn new_account(store: &RocksStore, kind: AccountKind) -> AccountId {
        let account = Account::new(AccountId::generate(), kind);
        store.put_account(&account).unwrap();
        account.id
    }

    fn grant(store: &RocksStore, account_id: AccountId, amount: u64) {
        let tx = CreditTransaction::admin_adjustment(
            account_id,
            amount,
            EntryDirection::Credit,
            "seed".into(),
        );
        store.append_transaction(&tx).unwrap();
    }

    #[test]
    fn club_summary_reflects_ledger_and_reservations() {
        let (aggregator, store, _dir) = setup();
        let club = new_account(&store, AccountKind::Club);
        grant(&store, club, 1000);

        let spend = CreditTransaction::spend(club, 300, "promotion".into());
        store.append_transaction(&spend).unwrap();

        let payout = Payout::new(club, 200, PayoutMethod::BankTransfer, "iban".into());
        store.create_payout(&payout).unwrap();

        let summary = aggregator.club_credit_summary(&club).unwrap();
        assert_eq!(summary.balance, 700);
        assert_eq!(summary.total_earned, 1000);
        assert_eq!(summary.total_spent, 300);
        assert_eq!(summary.pending_withdrawals, 200);
        assert_eq!(summary.available_for_withdrawal, 500);
    }

    #[test]
    fn earnings_summary_categorizes_by_source() {
        let (aggregator, store, _dir) = setup();
        let fan = new_account(&store, AccountKind::User);
        let creator = new_account(&store, AccountKind::User);
        grant(&store, fan, 1000);

        let (out_leg, in_leg) = CreditTransaction::transfer_pair(
            fan,
            creator,
            400,
            Some(EarningSource::Gift),
            "gift".into(),
        );
        store.append_transfer(&out_leg, &in_leg).unwrap();

        let (out_leg, in_leg) = CreditTransaction::transfer_pair(
            fan,
            creator,
            150,
            Some(EarningSource::FanPost),
            "fan post unlock".into(),
        );
        store.append_transfer(&out_leg, &in_leg).unwrap();

        let summary = aggregator.earnings_summary(&creator).unwrap();
        assert_eq!(summary.credits_from_gifts, 400);
        assert_eq!(summary.credits_from_fanposts, 150);
        assert_eq!(summary.credits_payouts, 0);
        assert_eq!(summary.credits_available, 550);
        assert!(summary.last_payout_at.is_none());
    }

    #[test]
    fn earnings_summary_tracks_payouts() {
        let (aggregator, store, _dir) = setup();
        let creator = new_account(&store, AccountKind::User);
        grant(&store, creator, 500);

        let payout = Payout::new(creator, 200, PayoutMethod::Paypal, "x@y.z".into());
        store.create_payout(&payout).unwrap();
        store.approve_payout(&payout.id).unwrap();
        let settlement = store.complete_payout(&payout.id).unwrap();
        assert!(matches!(settlement, PayoutSettlement::Completed { .. }));

        let summary = aggregator.earnings_summary(&creator).unwrap();
        assert_eq!(summary.credits_payouts, 200);
        assert_eq!(summary.credits_available, 300);
        assert!(summary.last_payout_at.is_some());

        let stored = store.get_payout(&payout.id).unwrap().unwrap();
        assert_eq!(stored.status, PayoutStatus::Completed);
    }

    #[test]
    fn unknown_account_is_not_found() {
        let (aggregator, _store, _dir) = setup();
        assert!(matches!(
            aggregator.club_credit_summary(&AccountId::generate()),
            Err(LedgerError::NotFound(_))
        ));
    }
}
