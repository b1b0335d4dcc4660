//! LRU Cache Module
//!
//! Byte-bounded Least Recently Used store with an eviction hook.
//!
//! Entries live in a slot arena and are linked into a doubly linked
//! recency list by index:
//!
//! ```text
//!   head (most recent) ─► [slot 3] ◄──► [slot 0] ◄──► [slot 1] ◄── tail (least recent)
//! ```
//!
//! `get`, `add` and `remove_oldest` are O(1) expected. Not safe for
//! concurrent use on its own; see [`MainCache`](crate::cache::MainCache).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// == Value Trait ==
/// Anything that can be charged against a byte budget.
pub trait Value {
    /// Number of bytes this value occupies.
    fn byte_len(&self) -> usize;
}

impl Value for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl Value for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with the key and value of every entry evicted for capacity.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V: Value> Node<V> {
    fn charge(&self) -> usize {
        self.key.len() + self.value.byte_len()
    }
}

// == LRU Cache ==
/// A cache bounded by the total bytes of its keys and values.
///
/// A `max_bytes` of zero disables the bound.
pub struct LruCache<V> {
    max_bytes: usize,
    used_bytes: usize,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: Value> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache with the given byte budget and optional eviction callback.
    pub fn new(max_bytes: usize, on_evicted: Option<EvictionCallback<V>>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted,
        }
    }

    // == Get ==
    /// Looks up a key, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    // == Peek ==
    /// Looks up a key without touching recency order.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    // == Add ==
    /// Inserts or replaces a value, then evicts least recently used entries
    /// until the byte budget holds again.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                let old_len = node.value.byte_len();
                let new_len = value.byte_len();
                node.value = value;
                self.used_bytes = self.used_bytes - old_len + new_len;
            }
            self.move_to_front(idx);
        } else {
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used_bytes += node.charge();
            let idx = self.alloc(node);
            self.attach_front(idx);
            self.index.insert(key, idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry, notifying the eviction callback.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        self.detach(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        self.used_bytes -= node.charge();

        if let Some(callback) = &self.on_evicted {
            callback(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    // == Length ==
    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == Keys ==
    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.slots[cursor?].as_ref()?;
            cursor = node.next;
            Some(node.key.as_str())
        })
    }

    // == Internal list maintenance ==
    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.slots[h].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .finish()
    }
}
