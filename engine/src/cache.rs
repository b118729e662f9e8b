//! Computed table: a direct-mapped cache with generation-based clearing.
//!
//! Each key hashes to exactly one slot. Entries are stamped with the current
//! generation and entries from older generations read as empty, so `clear()`
//! is O(1). The heap clears the cache on every garbage collection and
//! reordering, since cached results may name freed or moved nodes.

use std::cell::Cell;

use crate::reference::Ref;
use crate::utils::{mix64, pairing2, pairing3, SlotHash};

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    generation: u64,
}

impl<K: Default, V: Default> Default for Entry<K, V> {
    fn default() -> Self {
        Self {
            key: K::default(),
            value: V::default(),
            generation: 0,
        }
    }
}

pub(crate) struct Cache<K, V> {
    entries: Vec<Entry<K, V>>,
    bitmask: u64,
    generation: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K: Default, V: Default> Cache<K, V> {
    /// Create a cache with `2^bits` slots.
    pub fn new(bits: u32) -> Self {
        debug_assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);

        let size = 1usize << bits;
        Self {
            entries: (0..size).map(|_| Entry::default()).collect(),
            bitmask: (size - 1) as u64,
            // Start at 1 so default entries are invalid.
            generation: 1,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }
}

impl<K, V> Cache<K, V> {
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<K: SlotHash + Eq, V: Copy> Cache<K, V> {
    #[inline]
    fn index(&self, key: &K) -> usize {
        (mix64(key.slot_hash()) & self.bitmask) as usize
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = &self.entries[self.index(key)];
        if entry.generation == self.generation && entry.key == *key {
            self.hits.set(self.hits.get() + 1);
            Some(entry.value)
        } else {
            self.misses.set(self.misses.get() + 1);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Entry {
            key,
            value,
            generation: self.generation,
        };
    }
}

/// Operation tags of the computed table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum OpKey {
    Ite(Ref, Ref, Ref),
    Restrict(Ref, Ref),
    Exist(Ref, Ref),
    AndAbstract(Ref, Ref, Ref),
}

impl Default for OpKey {
    fn default() -> Self {
        OpKey::Ite(Ref::default(), Ref::default(), Ref::default())
    }
}

impl SlotHash for OpKey {
    fn slot_hash(&self) -> u64 {
        match *self {
            OpKey::Ite(f, g, h) => pairing3(f.raw() as u64, g.raw() as u64, h.raw() as u64),
            OpKey::Restrict(f, c) => pairing2(f.raw() as u64, c.raw() as u64).wrapping_mul(3),
            OpKey::Exist(f, c) => pairing2(f.raw() as u64, c.raw() as u64).wrapping_mul(5),
            OpKey::AndAbstract(f, g, c) => pairing3(f.raw() as u64, g.raw() as u64, c.raw() as u64).wrapping_mul(7),
        }
    }
}
