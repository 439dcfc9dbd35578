use crate::math::Real;
use core::cmp::Reverse;
use ordered_float::OrderedFloat;
use slab::Slab;
use alloc::collections::BinaryHeap;

/// A candidate merge of two adjacent clusters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PairProxy {
    /// A merge that can still be performed.
    Valid {
        /// The cluster that survives the merge.
        node_a: u32,
        /// The cluster absorbed by the merge.
        node_b: u32,
        /// The look-ahead tree of `node_a` when the cost was computed.
        tree_a: u32,
        /// The look-ahead tree of `node_b` when the cost was computed.
        tree_b: u32,
        /// The area of the union of both clusters.
        area: Real,
        /// The concavity of the union of both clusters.
        concavity: Real,
    },
    /// A merge made obsolete by a previous merge of one of its clusters.
    Invalidated,
}

impl PairProxy {
    /// Is this merge still valid?
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, PairProxy::Valid { .. })
    }
}

/// Min-heap of merge candidates keyed by cost.
///
/// Proxies are invalidated in place and skipped once popped. The heap is only cleaned
/// from its invalidated entries when it would grow past its reserved capacity.
#[derive(Clone, Debug, Default)]
pub(crate) struct PairHeap {
    proxies: Slab<PairProxy>,
    heap: BinaryHeap<Reverse<(OrderedFloat<Real>, u32)>>,
    reserved: usize,
}

impl PairHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        PairHeap {
            proxies: Slab::with_capacity(capacity),
            heap: BinaryHeap::with_capacity(capacity),
            reserved: capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&PairProxy> {
        self.proxies.get(id as usize)
    }

    pub fn push(&mut self, proxy: PairProxy, cost: Real) -> u32 {
        if self.heap.len() + 20 > self.reserved {
            self.collect_garbage();
        }

        let id = self.proxies.insert(proxy) as u32;
        self.heap.push(Reverse((OrderedFloat(cost), id)));
        id
    }

    pub fn invalidate(&mut self, id: u32) {
        if let Some(proxy) = self.proxies.get_mut(id as usize) {
            *proxy = PairProxy::Invalidated;
        }
    }

    /// The cost of the cheapest candidate, valid or not.
    pub fn min_cost(&self) -> Option<Real> {
        self.heap.peek().map(|Reverse((cost, _))| cost.0)
    }

    /// Removes the cheapest candidate.
    pub fn pop(&mut self) -> Option<(Real, PairProxy)> {
        let Reverse((cost, id)) = self.heap.pop()?;
        let proxy = self.proxies.try_remove(id as usize)?;
        Some((cost.0, proxy))
    }

    fn collect_garbage(&mut self) {
        let proxies = &mut self.proxies;
        self.heap.retain(|Reverse((_, id))| {
            let valid = proxies
                .get(*id as usize)
                .map(|p| p.is_valid())
                .unwrap_or(false);
            if !valid {
                let _ = proxies.try_remove(*id as usize);
            }
            valid
        });

        if self.heap.len() + 20 > self.reserved {
            self.reserved *= 2;
        }
    }
}

#[cfg(test)]
mod test {
    use super::{PairHeap, PairProxy};

    fn proxy(a: u32, b: u32) -> PairProxy {
        PairProxy::Valid {
            node_a: a,
            node_b: b,
            tree_a: a,
            tree_b: b,
            area: 1.0,
            concavity: 0.0,
        }
    }

    #[test]
    fn pop_in_cost_order_and_skip_invalidated() {
        let mut heap = PairHeap::with_capacity(64);
        let p0 = heap.push(proxy(0, 1), 3.0);
        let _ = heap.push(proxy(1, 2), 1.0);
        let p2 = heap.push(proxy(2, 3), 2.0);

        heap.invalidate(p2);
        assert_eq!(heap.get(p0), Some(&proxy(0, 1)));
        assert_eq!(heap.min_cost(), Some(1.0));

        assert_eq!(heap.pop(), Some((1.0, proxy(1, 2))));
        assert_eq!(heap.pop(), Some((2.0, PairProxy::Invalidated)));
        assert_eq!(heap.pop(), Some((3.0, proxy(0, 1))));
        assert!(heap.pop().is_none());
        assert!(heap.is_empty());
    }

    #[test]
    fn garbage_collection_keeps_valid_proxies() {
        let mut heap = PairHeap::with_capacity(31);
        let ids: Vec<_> = (0..12).map(|i| heap.push(proxy(i, i + 1), i as f64)).collect();
        for id in &ids[..10] {
            heap.invalidate(*id);
        }

        // This push overflows the reserved capacity and drops the invalidated entries.
        let _ = heap.push(proxy(100, 101), 0.5);
        assert_eq!(heap.len(), 3);

        let popped: Vec<_> = core::iter::from_fn(|| heap.pop()).collect();
        assert!(popped.iter().all(|(_, p)| p.is_valid()));
        assert_eq!(popped[0].0, 0.5);
    }
}
