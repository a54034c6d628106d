use std::hash::Hash;

use hash::{ExtendibleHash, HashTable};
use log::trace;
use parking_lot::Mutex;

use crate::list::{AccessList, Cursor};

/// Bucket capacity of the replacer's item-to-cursor index.
const INDEX_BUCKET_CAPACITY: usize = 2;

/// Eviction policy over a set of replaceable items.
///
/// Implementations synchronise internally, so all methods take `&self`
/// and are safe to call from multiple threads.
pub trait Replacer<T> {
    /// Records an access to `value`, tracking it if new.
    fn insert(&self, value: T);

    /// Removes and returns the item to evict, if any.
    fn victim(&self) -> Option<T>;

    /// Stops tracking `value`, returning whether it was tracked.
    fn erase(&self, value: &T) -> bool;

    /// Returns the number of tracked items.
    fn size(&self) -> usize;
}

/// LRU replacer that evicts the least recently accessed item.
///
/// Items sit in an access-ordered list, most recent at the front. A
/// hash index maps each item to its list cursor, so a repeated insert
/// (a touch) or a targeted erase unlinks the item without scanning.
/// Cursors stay valid until their own item is removed, and the index
/// entry for an item is dropped in the same critical section as its
/// node, so the two structures never disagree.
#[derive(Debug)]
pub struct LRUReplacer<T> {
    inner: Mutex<LruState<T>>,
}

#[derive(Debug)]
struct LruState<T> {
    list: AccessList<T>,
    index: ExtendibleHash<T, Cursor>,
}

impl<T> LRUReplacer<T>
where
    T: Hash + Eq + Clone,
{
    /// Creates an empty replacer. Capacity is the caller's concern.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LruState {
                list: AccessList::new(),
                index: ExtendibleHash::new(INDEX_BUCKET_CAPACITY),
            }),
        }
    }
}

impl<T> Default for LRUReplacer<T>
where
    T: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Replacer<T> for LRUReplacer<T>
where
    T: Hash + Eq + Clone,
{
    fn insert(&self, value: T) {
        let mut state = self.inner.lock();
        if let Some(cursor) = state.index.find(&value) {
            state.list.remove(cursor);
        }
        let cursor = state.list.push_front(value.clone());
        state.index.insert(value, cursor);
    }

    fn victim(&self) -> Option<T> {
        let mut state = self.inner.lock();
        let value = state.list.pop_back()?;
        state.index.remove(&value);
        trace!("evicting least recently used item");
        Some(value)
    }

    fn erase(&self, value: &T) -> bool {
        let mut state = self.inner.lock();
        match state.index.find(value) {
            Some(cursor) => {
                state.index.remove(value);
                state.list.remove(cursor);
                true
            }
            None => false,
        }
    }

    fn size(&self) -> usize {
        self.inner.lock().list.len()
    }
}
