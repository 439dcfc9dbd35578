use core::cmp::PartialOrd;
use core::ops::Deref;

/// A pair of elements sorted in increasing order.
///
/// Used as the key of undirected edges, so that `(a, b)` and `(b, a)` hash identically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SortedPair<T: PartialOrd>([T; 2]);

impl<T: PartialOrd> SortedPair<T> {
    /// Sorts two elements in increasing order into a new pair.
    pub fn new(element1: T, element2: T) -> Self {
        if element1 > element2 {
            SortedPair([element2, element1])
        } else {
            SortedPair([element1, element2])
        }
    }

    /// The smallest element of this pair.
    pub fn lower(&self) -> &T {
        &self.0[0]
    }

    /// The largest element of this pair.
    pub fn upper(&self) -> &T {
        &self.0[1]
    }
}

impl<T: PartialOrd> Deref for SortedPair<T> {
    type Target = [T; 2];

    fn deref(&self) -> &[T; 2] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::SortedPair;

    #[test]
    fn sorted_pair_is_order_independent() {
        assert_eq!(SortedPair::new(4u32, 1), SortedPair::new(1, 4));
        assert_eq!(*SortedPair::new(4u32, 1).lower(), 1);
        assert_eq!(*SortedPair::new(4u32, 1).upper(), 4);
        assert_eq!(SortedPair::new(7u32, 2)[1], 7);
    }
}
