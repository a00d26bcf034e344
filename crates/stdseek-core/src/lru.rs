//! Bounded least-recently-used map for the in-memory cache tier.
//!
//! Not synchronized; callers wrap it in a lock. Recency is a monotonically
//! increasing tick, so eviction order is exactly access order.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

pub struct LruCache<K, V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<K, (V, u64)>,
    order: BTreeMap<u64, K>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up and mark as most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tick = self.next_tick();
        let (owned_key, slot) = self.entries.get_key_value(key)?;
        let old = slot.1;
        let owned_key = owned_key.clone();
        self.order.remove(&old);
        self.order.insert(tick, owned_key);
        let entry = self.entries.get_mut(key)?;
        entry.1 = tick;
        Some(&entry.0)
    }

    /// Look up without touching recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|(v, _)| v)
    }

    /// Insert or replace, evicting the least recently used entry when
    /// full. Returns the evicted key, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        let tick = self.next_tick();
        if let Some((_, old)) = self.entries.remove(&key) {
            self.order.remove(&old);
        }
        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some((_, lru_key)) = self.order.pop_first() {
                self.entries.remove(&lru_key);
                evicted = Some(lru_key);
            }
        }
        self.order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
        evicted
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (value, tick) = self.entries.remove(key)?;
        self.order.remove(&tick);
        Some(value)
    }

    /// Keep only entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        let order = &mut self.order;
        self.entries.retain(|k, (v, tick)| {
            let k_keep = keep(k, v);
            if !k_keep {
                order.remove(&*tick);
            }
            k_keep
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.order.values().cloned().collect()
    }
}
