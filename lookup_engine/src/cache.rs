use std::{
    collections::{HashMap, VecDeque},
    sync::RwLock,
};

use gateway_tools::OrderRecord;
use log::trace;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// What a finished lookup learned about a `(merchant, order number)` pair. `ConfirmedAbsent`
/// means the gateway positively reported the order as nonexistent, which is distinct from
/// "never queried" and is served from cache like any other hit.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Found(OrderRecord),
    ConfirmedAbsent,
}

/// Process-wide result cache keyed by `(merchant_id, normalized order number)`.
///
/// Entries are written once: the first write for a key wins and later writes are ignored, so
/// concurrent lookups for the same key cannot clobber each other. Capacity is bounded; when
/// full, the oldest entry is evicted FIFO. Safe for concurrent use from any number of lookups.
#[derive(Debug)]
pub struct LookupCache {
    inner: RwLock<Inner>,
    max_entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<(i64, String), CacheEntry>,
    insertion_order: VecDeque<(i64, String)>,
}

impl LookupCache {
    /// `max_entries == 0` disables the capacity bound.
    pub fn new(max_entries: usize) -> Self {
        Self { inner: RwLock::new(Inner::default()), max_entries }
    }

    pub fn get(&self, merchant_id: i64, order_no: &str) -> Option<CacheEntry> {
        let inner = self.inner.read().expect("lookup cache lock poisoned");
        inner.entries.get(&(merchant_id, order_no.to_string())).cloned()
    }

    /// Insert unless the key already has an entry (first write wins).
    pub fn insert(&self, merchant_id: i64, order_no: &str, entry: CacheEntry) {
        let key = (merchant_id, order_no.to_string());
        let mut inner = self.inner.write().expect("lookup cache lock poisoned");
        if inner.entries.contains_key(&key) {
            trace!("Cache already holds an entry for merchant #{merchant_id} order {order_no}, keeping it");
            return;
        }
        if self.max_entries > 0 && inner.entries.len() >= self.max_entries {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.insertion_order.push_back(key.clone());
        inner.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("lookup cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
