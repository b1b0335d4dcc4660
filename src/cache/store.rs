//! Main Cache Module
//!
//! Thread-safe wrapper around a lazily allocated [`LruCache`].

use parking_lot::Mutex;

use crate::cache::{ByteView, EvictionCallback, LruCache};

// == Main Cache ==
/// Serializes all access to one byte-bounded LRU behind a mutex.
///
/// The LRU is only allocated on the first [`add`](MainCache::add), so a
/// group that never loads anything never pays for it.
pub struct MainCache {
    /// Byte budget for the underlying LRU (0 = unbounded)
    cache_bytes: usize,
    on_evicted: Option<EvictionCallback<ByteView>>,
    lru: Mutex<Option<LruCache<ByteView>>>,
}

impl MainCache {
    // == Constructor ==
    pub fn new(cache_bytes: usize) -> Self {
        Self {
            cache_bytes,
            on_evicted: None,
            lru: Mutex::new(None),
        }
    }

    /// Sets the callback handed to the LRU when it is allocated.
    ///
    /// The callback runs with the cache lock held and must not call back
    /// into this cache.
    pub fn with_eviction_callback(mut self, callback: EvictionCallback<ByteView>) -> Self {
        self.on_evicted = Some(callback);
        self
    }

    // == Add ==
    /// Stores a value, evicting older entries under the lock if needed.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut guard = self.lru.lock();
        let lru = guard
            .get_or_insert_with(|| LruCache::new(self.cache_bytes, self.on_evicted.clone()));
        lru.add(key, value);
    }

    // == Get ==
    /// Returns the cached value, promoting it to most recently used.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.lru.lock();
        guard.as_mut()?.get(key).cloned()
    }

    // == Peek ==
    /// Returns the cached value without changing recency order.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        let guard = self.lru.lock();
        guard.as_ref()?.peek(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lru.lock().as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn used_bytes(&self) -> usize {
        self.lru.lock().as_ref().map_or(0, LruCache::used_bytes)
    }

    pub fn cache_bytes(&self) -> usize {
        self.cache_bytes
    }

    /// Returns true once the first write has allocated the LRU.
    pub fn is_allocated(&self) -> bool {
        self.lru.lock().is_some()
    }
}

impl std::fmt::Debug for MainCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainCache")
            .field("cache_bytes", &self.cache_bytes)
            .field("lru", &*self.lru.lock())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_store_lazy_allocation() {
        let cache = MainCache::new(1024);
        assert!(!cache.is_allocated());

        assert!(cache.get("missing").is_none());
        assert!(!cache.is_allocated(), "reads must not allocate");

        cache.add("key", ByteView::from("value"));
        assert!(cache.is_allocated());
    }

    #[test]
    fn test_store_add_and_get() {
        let cache = MainCache::new(1024);
        cache.add("Tom", ByteView::from("630"));

        assert_eq!(cache.get("Tom"), Some(ByteView::from("630")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_bytes(), 6);
    }

    #[test]
    fn test_store_eviction_callback() {
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evictions);
        let cache = MainCache::new(8).with_eviction_callback(Arc::new(
            move |_key: &str, _value: &ByteView| {
                counter.fetch_add(1, Ordering::Relaxed);
            },
        ));

        cache.add("k1", ByteView::from("v1"));
        cache.add("k2", ByteView::from("v2"));
        cache.add("k3", ByteView::from("v3"));

        assert_eq!(evictions.load(Ordering::Relaxed), 1);
        assert!(cache.peek("k1").is_none());
        assert!(cache.used_bytes() <= 8);
    }

    #[test]
    fn test_store_concurrent_access() {
        let cache = Arc::new(MainCache::new(4096));
        let mut handles = Vec::new();

        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("t{}-k{}", t, i % 50);
                    cache.add(&key, ByteView::from(format!("value-{}", i)));
                    if let Some(view) = cache.get(&key) {
                        assert!(view.to_string_lossy().starts_with("value-"));
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        assert!(cache.used_bytes() <= 4096);
    }
}
