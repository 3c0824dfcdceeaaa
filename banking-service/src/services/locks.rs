//! Per-account serialization locks.
//!
//! Every balance read-modify-write runs under the owning account's lock;
//! operations on disjoint accounts proceed concurrently. Lock entries are
//! keyed by account id and live for the life of the process.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct AccountLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, account_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for a single account.
    pub async fn acquire(&self, account_id: &str) -> OwnedMutexGuard<()> {
        self.lock_for(account_id).lock_owned().await
    }

    /// Acquire the locks for two accounts in ascending id order, so two
    /// transfers racing over the same pair in opposite directions cannot
    /// deadlock. Equal ids take a single lock.
    pub async fn acquire_pair(
        &self,
        a: &str,
        b: &str,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.acquire(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await;
        let second_guard = self.acquire(second).await;
        (first_guard, Some(second_guard))
    }
}
