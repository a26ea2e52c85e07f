use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::tree::Neighbor;

// Ordered by (distance, index) so that equal distances resolve to the lower index.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    distance_squared: f64,
    index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A max-heap keeping the `capacity` best candidates within `max_distance_squared`.
pub(crate) struct NeighborHeap {
    heap: BinaryHeap<HeapEntry>,
    capacity: usize,
    max_distance_squared: f64,
}

impl NeighborHeap {
    pub(crate) fn new(capacity: usize, max_distance_squared: f64) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
            capacity,
            max_distance_squared,
        }
    }

    /// The squared distance a candidate must not exceed to be accepted.
    pub(crate) fn bound(&self) -> f64 {
        match self.heap.peek() {
            Some(top) if self.heap.len() >= self.capacity => top.distance_squared,
            _ => self.max_distance_squared,
        }
    }

    pub(crate) fn push(&mut self, index: usize, distance_squared: f64) {
        if self.capacity == 0 || distance_squared > self.max_distance_squared {
            return;
        }
        let entry = HeapEntry {
            distance_squared,
            index,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(entry);
        } else if let Some(mut top) = self.heap.peek_mut() {
            if entry < *top {
                *top = entry;
            }
        }
    }

    pub(crate) fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| Neighbor {
                index: e.index,
                distance_squared: e.distance_squared,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_keeps_best_and_breaks_ties_by_index() {
        let mut heap = NeighborHeap::new(2, f64::INFINITY);
        heap.push(5, 1.0);
        heap.push(3, 1.0);
        heap.push(7, 0.5);
        heap.push(1, 1.0);
        let res = heap.into_sorted_vec();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].index, 7);
        assert_eq!(res[1].index, 1);
    }

    #[test]
    fn test_heap_bound() {
        let mut heap = NeighborHeap::new(1, 4.0);
        assert_eq!(heap.bound(), 4.0);
        heap.push(0, 9.0);
        assert_eq!(heap.bound(), 4.0);
        heap.push(0, 2.0);
        assert_eq!(heap.bound(), 2.0);
    }
}
