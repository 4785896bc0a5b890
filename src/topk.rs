//! Bounded top-K selection under a runtime comparator.
//!
//! [`TopKHeap`] keeps the `k` best items seen so far, where "best" means
//! "listed first" under the comparator it was built with. Internally it is a
//! [`BinaryHeap`] whose root is the current worst item, so a full heap
//! decides each new item with one comparison and at most one sift-down.
//!
//! Every item is stamped with an arrival sequence number and the heap orders
//! by `(comparator, sequence)`. Exact ties therefore resolve first-seen-wins,
//! both for eviction and in the drained output.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

/// Runtime order shared by a heap and its entries. `Less` lists first.
pub type OrderFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Heap entry ordered by `(order, seq)`, so the max is the worst item.
struct Entry<T> {
    seq: u64,
    item: T,
    order: OrderFn<T>,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.order)(&self.item, &other.item).then(self.seq.cmp(&other.seq))
    }
}

impl<T: Clone> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            item: self.item.clone(),
            order: Arc::clone(&self.order),
        }
    }
}

/// Outcome of [`TopKHeap::offer`].
#[derive(Debug, PartialEq, Eq)]
pub enum Offer<T> {
    /// The heap had room.
    Inserted,
    /// The item displaced the previous worst, returned here.
    Replaced(T),
    /// The item ranked no better than the current worst.
    Rejected(T),
}

pub struct TopKHeap<T> {
    heap: BinaryHeap<Entry<T>>,
    k: usize,
    next_seq: u64,
    order: OrderFn<T>,
}

impl<T> TopKHeap<T> {
    #[must_use]
    pub fn new<F>(k: usize, order: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            heap: BinaryHeap::with_capacity(k.min(1024)),
            k,
            next_seq: 0,
            order: Arc::new(order),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.k
    }

    /// The item that would be evicted next.
    #[must_use]
    pub fn peek_worst(&self) -> Option<&T> {
        self.heap.peek().map(|e| &e.item)
    }

    /// Items in heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|e| &e.item)
    }

    /// Offer one item, O(log k).
    pub fn offer(&mut self, item: T) -> Offer<T> {
        if self.k == 0 {
            return Offer::Rejected(item);
        }
        let entry = self.entry(item);
        if self.heap.len() < self.k {
            self.heap.push(entry);
            return Offer::Inserted;
        }
        let Some(mut worst) = self.heap.peek_mut() else {
            return Offer::Rejected(entry.item);
        };
        // a newcomer always has the larger sequence, so it must be strictly
        // better to displace the root
        if entry >= *worst {
            return Offer::Rejected(entry.item);
        }
        // dropping `worst` sifts the newcomer down
        let old = std::mem::replace(&mut *worst, entry);
        Offer::Replaced(old.item)
    }

    /// Change the bound, evicting the worst items if the heap shrinks.
    pub fn set_capacity(&mut self, k: usize) -> Vec<T> {
        self.k = k;
        let mut evicted = Vec::new();
        while self.heap.len() > k {
            if let Some(worst) = self.pop_worst() {
                evicted.push(worst);
            }
        }
        evicted
    }

    /// Remove and return the current worst item.
    pub fn pop_worst(&mut self) -> Option<T> {
        self.heap.pop().map(|e| e.item)
    }

    /// Drain into output order, best first.
    pub fn drain_sorted(&mut self) -> Vec<T> {
        std::mem::take(&mut self.heap)
            .into_sorted_vec()
            .into_iter()
            .map(|e| e.item)
            .collect()
    }

    fn entry(&mut self, item: T) -> Entry<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        Entry {
            seq,
            item,
            order: Arc::clone(&self.order),
        }
    }
}

impl<T: Clone> Clone for TopKHeap<T> {
    fn clone(&self) -> Self {
        Self {
            heap: self.heap.clone(),
            k: self.k,
            next_seq: self.next_seq,
            order: Arc::clone(&self.order),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TopKHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopKHeap")
            .field("k", &self.k)
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asc(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn keeps_k_smallest_under_comparator() {
        let mut heap = TopKHeap::new(3, asc);
        for v in [9, 1, 8, 2, 7, 3] {
            heap.offer(v);
        }
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek_worst(), Some(&3));
        assert_eq!(heap.drain_sorted(), vec![1, 2, 3]);
        assert!(heap.is_empty());
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut heap = TopKHeap::new(0, asc);
        assert_eq!(heap.offer(1), Offer::Rejected(1));
        assert!(heap.is_empty());
    }

    #[test]
    fn ties_keep_first_seen() {
        // compare by key only; payload records arrival
        let mut heap = TopKHeap::new(2, |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        heap.offer((1, 'a'));
        heap.offer((1, 'b'));
        assert_eq!(heap.offer((1, 'c')), Offer::Rejected((1, 'c')));
        assert_eq!(heap.offer((0, 'd')), Offer::Replaced((1, 'b')));
        assert_eq!(heap.drain_sorted(), vec![(0, 'd'), (1, 'a')]);
    }

    #[test]
    fn shrinking_evicts_worst() {
        let mut heap = TopKHeap::new(4, asc);
        for v in [4, 3, 2, 1] {
            heap.offer(v);
        }
        let mut evicted = heap.set_capacity(2);
        evicted.sort_unstable();
        assert_eq!(evicted, vec![3, 4]);
        assert_eq!(heap.drain_sorted(), vec![1, 2]);
    }

    #[test]
    fn clones_are_independent() {
        let mut heap = TopKHeap::new(2, asc);
        heap.offer(5);
        let mut copy = heap.clone();
        copy.offer(1);
        assert_eq!(heap.len(), 1);
        assert_eq!(copy.drain_sorted(), vec![1, 5]);
    }
}
