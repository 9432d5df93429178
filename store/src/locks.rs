//! Per-account critical sections.
//!
//! Every balance-changing compound operation runs under the owning
//! account's exclusive lock: read, validate, batch-write, release. Reads
//! never take locks. Acquisition is bounded; a timeout surfaces
//! [`StoreError::Busy`](crate::StoreError::Busy) instead of blocking
//! indefinitely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use nocta_core::AccountId;

use crate::error::{Result, StoreError};

/// An acquired per-account critical section. Released on drop.
pub type AccountGuard = ArcMutexGuard<RawMutex, ()>;

/// Registry of per-account mutexes.
pub struct AccountLocks {
    inner: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl AccountLocks {
    /// Create a registry with the given acquisition bound.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn handle(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock();
        Arc::clone(map.entry(account_id).or_default())
    }

    /// Acquire the exclusive section for one account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` if the lock is not acquired within the
    /// configured bound.
    pub fn acquire(&self, account_id: AccountId) -> Result<AccountGuard> {
        self.handle(account_id)
            .try_lock_arc_for(self.timeout)
            .ok_or(StoreError::Busy)
    }

    /// Acquire the exclusive sections for two accounts (a transfer).
    ///
    /// Locks are taken in canonical id order so that two opposing transfers
    /// cannot deadlock. Passing the same account twice locks it once.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` if either lock is not acquired within the
    /// configured bound.
    pub fn acquire_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<(AccountGuard, Option<AccountGuard>)> {
        if a == b {
            return Ok((self.acquire(a)?, None));
        }
        let (first, second) = if a.as_bytes() < b.as_bytes() {
            (a, b)
        } else {
            (b, a)
        };
        let first_guard = self.acquire(first)?;
        let second_guard = self.acquire(second)?;
        Ok((first_guard, Some(second_guard)))
    }
}
