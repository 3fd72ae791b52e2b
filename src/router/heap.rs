//! Indexed binary min-heap with decrease-key.
//!
//! `std::collections::BinaryHeap` has no decrease-key, which the router's
//! relaxation step needs. A position map over a flat binary heap gives
//! O(log n) push, pop and decrease-key, which is plenty for negotiation
//! graphs of tens to low hundreds of nodes.

use crate::negotiator::NegotiatorId;
use std::collections::HashMap;

/// Min-heap of negotiator ids keyed by distance.
///
/// Keys must not be NaN; ordering uses `f64::total_cmp`. Equal keys pop in
/// an arbitrary order.
pub(crate) struct MinHeap {
    /// `(distance, id)` pairs in heap order.
    entries: Vec<(f64, NegotiatorId)>,
    /// Current index of each id in `entries`.
    positions: HashMap<NegotiatorId, usize>,
}

impl MinHeap {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, id: NegotiatorId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Insert an id with the given key. The id must not already be present.
    pub(crate) fn push(&mut self, id: NegotiatorId, key: f64) {
        debug_assert!(!self.contains(id), "id already queued");
        let index = self.entries.len();
        self.entries.push((key, id));
        self.positions.insert(id, index);
        self.sift_up(index);
    }

    /// Remove and return the minimum-key entry.
    pub(crate) fn pop_min(&mut self) -> Option<(NegotiatorId, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let (key, id) = self.entries.pop().expect("checked non-empty");
        self.positions.remove(&id);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((id, key))
    }

    /// Lower the key of a queued id and restore heap order.
    pub(crate) fn decrease_key(&mut self, id: NegotiatorId, key: f64) {
        let index = *self.positions.get(&id).expect("id not queued");
        debug_assert!(key <= self.entries[index].0, "key did not decrease");
        self.entries[index].0 = key;
        self.sift_up(index);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.entries[index].0.total_cmp(&self.entries[parent].0).is_lt() {
                self.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < self.entries.len()
                && self.entries[left].0.total_cmp(&self.entries[smallest].0).is_lt()
            {
                smallest = left;
            }
            if right < self.entries.len()
                && self.entries[right].0.total_cmp(&self.entries[smallest].0).is_lt()
            {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].1, a);
        self.positions.insert(self.entries[b].1, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiator::Negotiator;
    use std::sync::Arc;

    fn ids(n: usize) -> Vec<(NegotiatorId, Arc<Negotiator>)> {
        // Keep the Arcs alive so pointer-derived ids stay distinct.
        (0..n)
            .map(|_| {
                let negotiator = Negotiator::identity::<String>();
                (NegotiatorId::of(&negotiator), negotiator)
            })
            .collect()
    }

    #[test]
    fn test_pop_order() {
        let nodes = ids(4);
        let mut heap = MinHeap::new();
        heap.push(nodes[0].0, 3.0);
        heap.push(nodes[1].0, 1.0);
        heap.push(nodes[2].0, 2.0);
        heap.push(nodes[3].0, 0.5);

        let mut popped = Vec::new();
        while let Some((_, key)) = heap.pop_min() {
            popped.push(key);
        }
        assert_eq!(popped, vec![0.5, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decrease_key_reorders() {
        let nodes = ids(3);
        let mut heap = MinHeap::new();
        heap.push(nodes[0].0, 10.0);
        heap.push(nodes[1].0, 20.0);
        heap.push(nodes[2].0, 30.0);

        heap.decrease_key(nodes[2].0, 5.0);

        let (first, key) = heap.pop_min().unwrap();
        assert_eq!(first, nodes[2].0);
        assert_eq!(key, 5.0);
    }

    #[test]
    fn test_contains_tracks_membership() {
        let nodes = ids(1);
        let mut heap = MinHeap::new();
        assert!(!heap.contains(nodes[0].0));
        heap.push(nodes[0].0, 1.0);
        assert!(heap.contains(nodes[0].0));
        heap.pop_min();
        assert!(!heap.contains(nodes[0].0));
        assert!(heap.is_empty());
    }
}
