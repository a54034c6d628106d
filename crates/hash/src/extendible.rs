use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::mem;

use ahash::RandomState;
use log::{debug, warn};
use parking_lot::RwLock;

use crate::table::HashTable;

/// `(1 << depth) - 1` without overflowing at the full hash width.
fn low_bits(depth: u32) -> u64 {
    match 1u64.checked_shl(depth) {
        Some(bound) => bound - 1,
        None => u64::MAX,
    }
}

/// Fixed-capacity key store discriminated by the low `local_depth` hash
/// bits. Every key in a bucket satisfies `hash(key) & mask == flag`.
#[derive(Debug)]
struct Bucket<K, V> {
    entries: HashMap<K, V>,
    local_depth: u32,
    mask: u64,
    flag: u64,
}

impl<K, V> Bucket<K, V> {
    fn new(local_depth: u32, flag: u64) -> Self {
        Self {
            entries: HashMap::new(),
            local_depth,
            mask: low_bits(local_depth),
            flag,
        }
    }
}

/// Directory state guarded by the table lock.
///
/// Buckets live in an arena and are addressed by index; a directory slot
/// is one such index, and several slots reference the same bucket while
/// its local depth is below the global depth. Buckets are created by
/// splits and never freed.
#[derive(Debug)]
struct Directory<K, V> {
    buckets: Vec<Bucket<K, V>>,
    /// One arena index per hash prefix; length is always `2^global_depth`.
    slots: Vec<usize>,
    global_depth: u32,
    global_mask: u64,
}

impl<K, V> Directory<K, V> {
    fn bucket_index(&self, hash: u64) -> usize {
        self.slots[(hash & self.global_mask) as usize]
    }
}

/// Concurrent extendible hash table.
///
/// The directory is indexed by the low `global_depth` bits of a 64-bit
/// key hash. A full bucket splits into two siblings one depth level
/// down; when a bucket's depth would exceed the global depth, the
/// directory doubles first. The directory never shrinks and buckets are
/// never merged, mirroring what a buffer pool page table needs.
///
/// Like `std::collections::HashMap`, the table is generic over the
/// `BuildHasher` supplying `hash_key`; the default is `ahash`.
#[derive(Debug)]
pub struct ExtendibleHash<K, V, S = RandomState> {
    bucket_capacity: usize,
    hash_builder: S,
    state: RwLock<Directory<K, V>>,
}

impl<K, V> ExtendibleHash<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Creates a table whose buckets hold up to `bucket_capacity` keys.
    pub fn new(bucket_capacity: usize) -> Self {
        Self::with_hasher(bucket_capacity, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHash<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a table using `hash_builder` to hash keys.
    ///
    /// Panics if `bucket_capacity` is zero.
    pub fn with_hasher(bucket_capacity: usize, hash_builder: S) -> Self {
        assert!(bucket_capacity >= 1, "bucket capacity must be at least 1");
        Self {
            bucket_capacity,
            hash_builder,
            state: RwLock::new(Directory {
                buckets: vec![Bucket::new(0, 0)],
                slots: vec![0],
                global_depth: 0,
                global_mask: 0,
            }),
        }
    }

    /// Raw 64-bit hash of `key`; the low `global_depth` bits select the
    /// directory slot.
    pub fn hash_key(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Number of low-order hash bits currently indexing the directory.
    pub fn global_depth(&self) -> usize {
        self.state.read().global_depth as usize
    }

    /// Local depth of the bucket referenced by directory slot `slot`.
    ///
    /// Panics if `slot` is not below `2^global_depth`.
    pub fn local_depth(&self, slot: usize) -> usize {
        let dir = self.state.read();
        dir.buckets[dir.slots[slot]].local_depth as usize
    }

    /// Number of distinct buckets allocated so far.
    pub fn num_buckets(&self) -> usize {
        self.state.read().buckets.len()
    }

    /// Splits the bucket at arena index `old_idx` one depth level down,
    /// doubling the directory first if the new depth would exceed it.
    ///
    /// The old bucket keeps its flag (a zero in the new bit); the
    /// sibling takes the flag with the new bit set and receives every
    /// entry hashing to it. Afterwards every slot matching the sibling's
    /// flag is rewritten; those slots referenced the old bucket before,
    /// so no other bucket is disturbed.
    fn split(dir: &mut Directory<K, V>, hash_builder: &S, old_idx: usize) {
        let old = &mut dir.buckets[old_idx];
        let new_depth = old.local_depth + 1;
        let new_mask = low_bits(new_depth);
        let new_flag = old.flag | 1u64 << old.local_depth;
        debug!(
            "splitting bucket {old_idx} to local depth {new_depth} ({} entries)",
            old.entries.len()
        );
        old.local_depth = new_depth;
        old.mask = new_mask;

        let mut sibling = Bucket::new(new_depth, new_flag);
        let drained = mem::take(&mut dir.buckets[old_idx].entries);
        for (key, value) in drained {
            if hash_builder.hash_one(&key) & new_mask == new_flag {
                sibling.entries.insert(key, value);
            } else {
                dir.buckets[old_idx].entries.insert(key, value);
            }
        }
        let new_idx = dir.buckets.len();
        dir.buckets.push(sibling);

        if new_depth > dir.global_depth {
            // Slot i + 2^G takes the pre-grow value of slot i, which is
            // exactly (i + 2^G) & global_mask.
            dir.slots.extend_from_within(..);
            dir.global_depth += 1;
            dir.global_mask = low_bits(dir.global_depth);
            debug!("doubling directory to global depth {}", dir.global_depth);
        }

        for (slot, bucket) in dir.slots.iter_mut().enumerate() {
            if (slot as u64) & new_mask == new_flag {
                *bucket = new_idx;
            }
        }
    }
}

impl<K, V, S> HashTable<K, V> for ExtendibleHash<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash_key(key);
        let dir = self.state.read();
        dir.buckets[dir.bucket_index(hash)].entries.get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        let hash = self.hash_key(&key);
        let mut dir = self.state.write();
        let mut bucket_idx = dir.bucket_index(hash);
        if let Some(stored) = dir.buckets[bucket_idx].entries.get_mut(&key) {
            *stored = value;
            return;
        }
        while dir.buckets[bucket_idx].entries.len() >= self.bucket_capacity {
            let full = &dir.buckets[bucket_idx];
            // A bucket whose keys all share the inserted key's full hash
            // can never be partitioned; take the oversubscription instead
            // of splitting forever.
            if full
                .entries
                .keys()
                .all(|stored| self.hash_key(stored) == hash)
            {
                warn!(
                    "bucket {bucket_idx} holds {} keys with one shared hash; \
                     accepting entry beyond capacity {}",
                    full.entries.len(),
                    self.bucket_capacity
                );
                break;
            }
            Self::split(&mut dir, &self.hash_builder, bucket_idx);
            bucket_idx = dir.bucket_index(hash);
        }
        dir.buckets[bucket_idx].entries.insert(key, value);
    }

    fn remove(&self, key: &K) -> bool {
        let hash = self.hash_key(key);
        let mut dir = self.state.write();
        let bucket_idx = dir.bucket_index(hash);
        dir.buckets[bucket_idx].entries.remove(key).is_some()
    }
}
