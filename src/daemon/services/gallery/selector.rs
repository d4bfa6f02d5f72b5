//! Bounded top-K selection for paginated listings.
//!
//! A page `p` of size `n` over a newest-first ordering only ever needs the
//! `p * n` newest items. [`BoundedTopK`] keeps exactly those in a min-heap
//! while the walk streams past every candidate, so a recursive listing over
//! a large output tree costs `O(p * n)` memory instead of the whole tree.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Heap capacity is preallocated up to this many slots; larger bounds grow
/// on demand.
const MAX_PREALLOCATED: usize = 1024;

/// Keeps the `capacity` greatest items pushed into it.
///
/// The heap stores `Reverse<T>` so its top is the smallest retained item,
/// which is the one a better candidate displaces.
#[derive(Debug)]
pub struct BoundedTopK<T: Ord> {
    heap: BinaryHeap<Reverse<T>>,
    capacity: usize,
}

impl<T: Ord> BoundedTopK<T> {
    /// Create an empty selector retaining at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(MAX_PREALLOCATED)),
            capacity,
        }
    }

    /// Offer a candidate. Returns `true` if it was retained.
    pub fn push(&mut self, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut current_min) if item > current_min.0 => {
                *current_min = Reverse(item);
                true
            },
            _ => false,
        }
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consume the selector, returning retained items greatest first.
    pub fn into_sorted_desc(self) -> Vec<T> {
        // Ascending order of Reverse<T> is descending order of T.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(item)| item)
            .collect()
    }
}

/// Streaming page selection with a full count of qualifying items.
///
/// With a bound the selector delegates to [`BoundedTopK`]; without one
/// (unbounded page size) it collects everything and sorts at the end.
#[derive(Debug)]
pub struct PageSelector<T: Ord> {
    mode: Mode<T>,
    total: usize,
}

#[derive(Debug)]
enum Mode<T: Ord> {
    Bounded(BoundedTopK<T>),
    Unbounded(Vec<T>),
}

impl<T: Ord> PageSelector<T> {
    /// Retain only the `needed` greatest items.
    pub fn bounded(needed: usize) -> Self {
        Self {
            mode: Mode::Bounded(BoundedTopK::new(needed)),
            total: 0,
        }
    }

    /// Retain every item.
    pub fn unbounded() -> Self {
        Self {
            mode: Mode::Unbounded(Vec::new()),
            total: 0,
        }
    }

    /// Count a qualifying item and retain it if it ranks.
    pub fn offer(&mut self, item: T) {
        self.total += 1;
        match &mut self.mode {
            Mode::Bounded(top) => {
                top.push(item);
            },
            Mode::Unbounded(all) => all.push(item),
        }
    }

    /// Retained items greatest first, plus the total offered.
    pub fn finish(self) -> (Vec<T>, usize) {
        let items = match self.mode {
            Mode::Bounded(top) => top.into_sorted_desc(),
            Mode::Unbounded(mut all) => {
                all.sort_unstable_by(|a, b| b.cmp(a));
                all
            },
        };
        (items, self.total)
    }
}

/// Slice `[start, end)` out of `items`, clamped to its length.
pub fn page_slice<T>(mut items: Vec<T>, start: usize, end: usize) -> Vec<T> {
    if start >= items.len() {
        return Vec::new();
    }
    items.truncate(end.min(items.len()));
    items.drain(..start);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_greatest() {
        let mut top = BoundedTopK::new(3);
        for value in [5, 1, 9, 3, 7, 2, 8] {
            top.push(value);
        }
        assert_eq!(top.len(), 3);
        assert_eq!(top.into_sorted_desc(), vec![9, 8, 7]);
    }

    #[test]
    fn test_push_reports_retention() {
        let mut top = BoundedTopK::new(2);
        assert!(top.push(4));
        assert!(top.push(6));
        assert!(!top.push(1));
        assert!(top.push(5));
        assert_eq!(top.into_sorted_desc(), vec![6, 5]);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut top = BoundedTopK::new(0);
        assert!(!top.push(1));
        assert!(top.is_empty());
        assert!(top.into_sorted_desc().is_empty());
    }

    #[test]
    fn test_fewer_items_than_capacity() {
        let mut top = BoundedTopK::new(10);
        top.push(2);
        top.push(1);
        assert_eq!(top.into_sorted_desc(), vec![2, 1]);
    }

    #[test]
    fn test_selector_counts_everything() {
        let mut bounded = PageSelector::bounded(2);
        let mut unbounded = PageSelector::unbounded();
        for value in 0..50 {
            bounded.offer(value);
            unbounded.offer(value);
        }
        let (kept, total) = bounded.finish();
        assert_eq!(kept, vec![49, 48]);
        assert_eq!(total, 50);

        let (all, total) = unbounded.finish();
        assert_eq!(all.len(), 50);
        assert_eq!(all[0], 49);
        assert_eq!(total, 50);
    }

    #[test]
    fn test_page_slice() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(page_slice(items.clone(), 0, 3), vec![0, 1, 2]);
        assert_eq!(page_slice(items.clone(), 8, 12), vec![8, 9]);
        assert!(page_slice(items.clone(), 10, 20).is_empty());
        assert!(page_slice(items, 30, 40).is_empty());
    }
}
