use nv_schemas::DedupeKey;
use std::collections::{HashSet, VecDeque};

/// Bounded idempotent-ingestion window keyed by `(symbol, ts_micros,
/// bar_index, variant)` (spec §4.1: "dedupe window is the last 10 000
/// events per chart").
///
/// `insert` returns `true` the first time a key is seen and `false` for a
/// repeat; repeats are silently dropped by the caller and counted as
/// `dedupe_dropped`.
pub struct DedupeWindow {
    capacity: usize,
    order: VecDeque<DedupeKey>,
    seen: HashSet<DedupeKey>,
}

impl DedupeWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity.min(1024)),
            seen: HashSet::with_capacity(capacity.min(1024)),
        }
    }

    pub fn insert(&mut self, key: DedupeKey) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: i64) -> DedupeKey {
        ("ES".to_string(), i, i, "trade")
    }

    #[test]
    fn first_insert_is_new_second_is_duplicate() {
        let mut w = DedupeWindow::new(10);
        assert!(w.insert(key(1)));
        assert!(!w.insert(key(1)));
    }

    #[test]
    fn eviction_allows_reinsertion_of_old_keys() {
        let mut w = DedupeWindow::new(2);
        assert!(w.insert(key(1)));
        assert!(w.insert(key(2)));
        assert!(w.insert(key(3))); // evicts key(1)
        assert!(w.insert(key(1))); // no longer tracked, treated as new
        assert_eq!(w.len(), 2);
    }
}
