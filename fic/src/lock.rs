//! Per-key async locks
//!
//! NAT, firewall and global IP address set changes on the same router are
//! rejected by the API while another one is in flight, so they are run one at
//! a time per router id. An entry only lives while someone holds or waits
//! for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

type Entries = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

#[derive(Debug, Default)]
pub struct KeyedLock {
    locks: Mutex<Entries>,
}

/// Held for as long as the key is locked
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: OwnedMutexGuard<()>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Waits until no other holder of `key` is left. The lock is released when
    /// the guard is dropped.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let entry = self
            .entries()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        tracing::debug!("Waiting for lock on {}", key);
        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: entry.lock_owned().await,
        }
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        let mut entries = self.owner.entries();
        // One reference in the map and one in this guard means nobody waits
        if Arc::strong_count(OwnedMutexGuard::mutex(&self.guard)) == 2 {
            entries.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn serializes_same_key() {
        let locks = Arc::new(KeyedLock::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let active = active.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    let _guard = locks.lock("F022000000001").await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        futures::future::join_all(tasks).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn same_key_waits_for_release() {
        let locks = KeyedLock::new();
        let mut first = tokio_test::task::spawn(locks.lock("F022000000001"));
        let guard = tokio_test::assert_ready!(first.poll());

        let mut second = tokio_test::task::spawn(locks.lock("F022000000001"));
        tokio_test::assert_pending!(second.poll());
        drop(guard);
        assert!(second.is_woken());
        tokio_test::assert_ready!(second.poll());
    }

    #[test]
    fn entry_is_dropped_with_the_last_holder() {
        let locks = KeyedLock::new();
        let mut first = tokio_test::task::spawn(locks.lock("F022000000001"));
        let guard = tokio_test::assert_ready!(first.poll());
        let mut second = tokio_test::task::spawn(locks.lock("F022000000001"));
        tokio_test::assert_pending!(second.poll());

        drop(guard);
        assert_eq!(locks.entries().len(), 1);

        let guard = tokio_test::assert_ready!(second.poll());
        drop(guard);
        assert!(locks.entries().is_empty());
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLock::new();
        let _a = locks.lock("F022000000001").await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.lock("F022000000002")).await;
        assert!(b.is_ok());
    }
}
