//! Victim selection for a buffer pool manager.
//!
//! The replacer tracks unpinned items in access order so the pool can
//! reclaim the least recently used one in O(1). Lookup from an item to
//! its place in the access list goes through an extendible hash table,
//! so touch and targeted removal are O(1) as well.

// MODULE DECLARATIONS
// These files exist internally but we decide what to expose below.
mod list;
mod replacer;

// PUBLIC API EXPORTS
pub use replacer::{LRUReplacer, Replacer};
