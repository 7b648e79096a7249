//! Expire-after-access map.
//!
//! Entries are dropped once they have gone `ttl` without being touched.
//! Reads treat an expired entry as absent and replace it on insert, so a
//! late sweep never resurrects stale state; [`ExpiringMap::purge_expired`]
//! reclaims the memory from a maintenance task.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    last_access: Instant,
}

impl<V> Slot<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_access) >= ttl
    }
}

/// Concurrent map whose entries expire after a period of inactivity.
pub struct ExpiringMap<K, V> {
    entries: DashMap<K, Slot<V>>,
    ttl: Duration,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Run `f` on the live value for `key`, creating it with `init` first if
    /// it is missing or expired. Touches the entry.
    ///
    /// The shard lock is held while `init` and `f` run, so concurrent first
    /// access for one key creates exactly one value. Neither closure may
    /// block.
    pub fn with_or_insert<R>(&self, key: K, init: impl FnOnce() -> V, f: impl FnOnce(&V) -> R) -> R {
        let now = Instant::now();
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.is_expired(now, self.ttl) {
                    slot.value = init();
                }
                slot.last_access = now;
                f(&slot.value)
            }
            Entry::Vacant(vacant) => {
                let slot = vacant.insert(Slot::new(init(), now));
                f(&slot.value)
            }
        }
    }

    /// Clone the live value for `key` and touch it.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let now = Instant::now();
        let mut slot = self.entries.get_mut(key)?;
        if slot.is_expired(now, self.ttl) {
            return None;
        }
        slot.last_access = now;
        Some(slot.value.clone())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|slot| !slot.is_expired(now, self.ttl))
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, slot)| slot.value)
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            if slot.is_expired(now, self.ttl) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Entries currently stored, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_idle_period() {
        let map = ExpiringMap::new(Duration::from_secs(180));
        map.with_or_insert("u1", || 1, |_| ());
        map.with_or_insert("u2", || 2, |_| ());

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(map.get_cloned(&"u1"), Some(1));

        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(map.contains_key(&"u1"));
        assert!(!map.contains_key(&"u2"));
        assert_eq!(map.purge_expired(), 1);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_rebuilt_on_access() {
        let map = ExpiringMap::new(Duration::from_secs(10));
        map.with_or_insert("k", || 1, |_| ());
        tokio::time::advance(Duration::from_secs(11)).await;
        let value = map.with_or_insert("k", || 2, |v| *v);
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn concurrent_first_access_creates_once() {
        let map = Arc::new(ExpiringMap::new(Duration::from_secs(60)));
        let created = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let map = Arc::clone(&map);
            let created = Arc::clone(&created);
            tasks.push(tokio::spawn(async move {
                map.with_or_insert(
                    7u64,
                    || created.fetch_add(1, Ordering::SeqCst),
                    |v| *v,
                )
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), 0);
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }
}
