use super::bvh_tree::NO_PARENT;
use super::{Bvh, BvhNode, BvhNodeKind, LEAF_CAPACITY};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, DIM};

impl Bvh {
    /// Builds a BVH over the given primitive AABBs.
    ///
    /// The primitive `i` of every query is the one bounded by `leaves[i]`.
    pub fn from_leaves(leaves: &[Aabb]) -> Self {
        let mut result = Bvh {
            nodes: Vec::with_capacity(2 * (leaves.len() / LEAF_CAPACITY + 1)),
            primitive_indices: (0..leaves.len() as u32).collect(),
        };

        if leaves.is_empty() {
            return result;
        }

        let centers: Vec<_> = leaves.iter().map(|aabb| aabb.center()).collect();
        let mut indices = core::mem::take(&mut result.primitive_indices);
        let _ = result.build_recursive(leaves, &centers, &mut indices, 0, NO_PARENT);
        result.primitive_indices = indices;
        result
    }

    fn build_recursive(
        &mut self,
        leaves: &[Aabb],
        centers: &[Point<Real>],
        indices: &mut [u32],
        offset: u32,
        parent: u32,
    ) -> u32 {
        let id = self.nodes.len() as u32;
        let aabb = indices
            .iter()
            .map(|i| leaves[*i as usize])
            .fold(Aabb::new_invalid(), |acc, aabb| acc.merged(&aabb));

        if indices.len() <= LEAF_CAPACITY {
            self.nodes.push(BvhNode {
                aabb,
                kind: BvhNodeKind::Leaf {
                    first: offset,
                    last: offset + indices.len() as u32 - 1,
                },
                parent,
            });
            return id;
        }

        // Placeholder, replaced once both children exist.
        self.nodes.push(BvhNode {
            aabb,
            kind: BvhNodeKind::Internal { left: 0, right: 0 },
            parent,
        });

        let split = split_at_mean_of_largest_variance(centers, indices);
        let (left_indices, right_indices) = indices.split_at_mut(split);
        let left = self.build_recursive(leaves, centers, left_indices, offset, id);
        let right = self.build_recursive(
            leaves,
            centers,
            right_indices,
            offset + split as u32,
            id,
        );

        self.nodes[id as usize].kind = BvhNodeKind::Internal { left, right };
        id
    }
}

/// Reorders `indices` in-place so that the primitives with a center below the mean along
/// the axis of largest variance come first, and returns the size of that first group.
///
/// The returned value is always in `[1, indices.len() - 1]`.
fn split_at_mean_of_largest_variance(centers: &[Point<Real>], indices: &mut [u32]) -> usize {
    let n = indices.len() as Real;
    let mut sum = [0.0; DIM];
    let mut sum_sq = [0.0; DIM];

    for i in indices.iter() {
        let c = &centers[*i as usize];
        for k in 0..DIM {
            sum[k] += c[k];
            sum_sq[k] += c[k] * c[k];
        }
    }

    let mut axis = 0;
    let mut max_variance = -1.0;
    for k in 0..DIM {
        let variance = sum_sq[k] * n - sum[k] * sum[k];
        if variance > max_variance {
            max_variance = variance;
            axis = k;
        }
    }

    let test = sum[axis] / n;

    // Hoare partition around the mean.
    let mut i0 = 0;
    let mut i1 = indices.len() - 1;
    loop {
        while i0 <= i1 && centers[indices[i0] as usize][axis] <= test {
            i0 += 1;
        }
        while i1 > i0 && centers[indices[i1] as usize][axis] > test {
            i1 -= 1;
        }

        if i0 >= i1 {
            break;
        }

        indices.swap(i0, i1);
    }

    // All the centers lie on the same side, e.g. when they coincide.
    if i0 == 0 || i0 >= indices.len() {
        indices.len() / 2
    } else {
        i0
    }
}
