/// Key-value lookup interface for page-table style maps.
///
/// Implementations synchronise internally, so all methods take `&self`
/// and are safe to call from multiple threads.
pub trait HashTable<K, V> {
    /// Returns the value stored for `key`, if any.
    fn find(&self, key: &K) -> Option<V>;

    /// Inserts `value` under `key`, replacing any previous value.
    fn insert(&self, key: K, value: V);

    /// Removes the entry for `key`, returning whether one was present.
    fn remove(&self, key: &K) -> bool;
}
