use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use buffer::{LRUReplacer, Replacer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn drains_in_insertion_order() {
    let replacer = LRUReplacer::new();
    for frame in 1..=5u64 {
        replacer.insert(frame);
    }
    assert_eq!(replacer.size(), 5);

    for expected in 1..=5u64 {
        assert_eq!(replacer.victim(), Some(expected));
    }
    assert_eq!(replacer.victim(), None);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn touch_and_erase_reshape_the_victim_order() {
    let replacer = LRUReplacer::new();
    for frame in 1..=4u64 {
        replacer.insert(frame);
    }
    replacer.insert(1);

    assert!(replacer.erase(&3));
    assert!(!replacer.erase(&3));

    assert_eq!(replacer.victim(), Some(2));
    assert_eq!(replacer.victim(), Some(4));
    assert_eq!(replacer.victim(), Some(1));
    assert_eq!(replacer.victim(), None);
}

#[test]
fn size_counts_distinct_items_only() {
    let replacer = LRUReplacer::new();
    replacer.insert("a");
    replacer.insert("b");
    replacer.insert("a");
    assert_eq!(replacer.size(), 2);

    assert!(replacer.erase(&"b"));
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.victim(), Some("a"));
    assert_eq!(replacer.size(), 0);
    assert!(!replacer.erase(&"a"));
}

#[test]
fn erase_then_victim_never_yields_the_erased_item() {
    let replacer = LRUReplacer::new();
    for frame in 0..8u64 {
        replacer.insert(frame);
    }
    for frame in (0..8u64).step_by(2) {
        assert!(replacer.erase(&frame));
    }
    let mut survivors = Vec::new();
    while let Some(frame) = replacer.victim() {
        survivors.push(frame);
    }
    assert_eq!(survivors, vec![1, 3, 5, 7]);
}

#[test]
fn matches_a_reference_model_under_random_traffic() {
    let mut rng = StdRng::seed_from_u64(11);
    let replacer = LRUReplacer::new();
    // Model: front is most recent, back is next victim.
    let mut model: Vec<u64> = Vec::new();

    for _ in 0..4_000 {
        let frame = rng.gen_range(0..64u64);
        match rng.gen_range(0..4) {
            0 | 1 => {
                replacer.insert(frame);
                model.retain(|&tracked| tracked != frame);
                model.insert(0, frame);
            }
            2 => {
                let expected = model.pop();
                assert_eq!(replacer.victim(), expected);
            }
            _ => {
                let expected = model.contains(&frame);
                assert_eq!(replacer.erase(&frame), expected);
                model.retain(|&tracked| tracked != frame);
            }
        }
        assert_eq!(replacer.size(), model.len());
    }
}

#[test]
fn concurrent_inserts_victimise_every_item_exactly_once() {
    let replacer = Arc::new(LRUReplacer::new());
    let threads = 4u64;
    let per_thread = 250u64;

    let handles: Vec<_> = (0..threads)
        .map(|thread_id| {
            let replacer = Arc::clone(&replacer);
            thread::spawn(move || {
                for i in 0..per_thread {
                    replacer.insert(thread_id * per_thread + i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(replacer.size(), (threads * per_thread) as usize);

    let mut seen = HashSet::new();
    while let Some(frame) = replacer.victim() {
        assert!(seen.insert(frame), "frame {frame} victimised twice");
    }
    assert_eq!(seen.len(), (threads * per_thread) as usize);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn concurrent_mixed_traffic_never_loses_or_duplicates_items() {
    let replacer = Arc::new(LRUReplacer::new());
    let threads = 4u64;
    let per_thread = 200u64;

    let handles: Vec<_> = (0..threads)
        .map(|thread_id| {
            let replacer = Arc::clone(&replacer);
            thread::spawn(move || {
                let mut evicted = Vec::new();
                for i in 0..per_thread {
                    let frame = thread_id * per_thread + i;
                    replacer.insert(frame);
                    // Interleave evictions so list and index churn
                    // together under contention.
                    if i % 3 == 0 {
                        if let Some(frame) = replacer.victim() {
                            evicted.push(frame);
                        }
                    }
                }
                evicted
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for frame in handle.join().unwrap() {
            assert!(seen.insert(frame), "frame {frame} victimised twice");
        }
    }
    while let Some(frame) = replacer.victim() {
        assert!(seen.insert(frame), "frame {frame} victimised twice");
    }
    assert_eq!(seen.len(), (threads * per_thread) as usize);
}
