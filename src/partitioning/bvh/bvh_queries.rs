use super::{Bvh, BvhNodeKind};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, Vector};
use crate::query::{Ray, RayCast};
use ordered_float::OrderedFloat;
use alloc::collections::BinaryHeap;

impl Bvh {
    /// Iterates through every primitive whose leaf intersects the given AABB.
    ///
    /// Primitives sharing a leaf with an intersecting primitive are yielded too: callers
    /// needing an exact answer must test the primitive itself.
    pub fn intersect_aabb<'a>(&'a self, aabb: &'a Aabb) -> impl Iterator<Item = u32> + 'a {
        self.leaves(move |node| node.aabb.intersects(aabb))
    }

    /// Casts a ray on this tree.
    ///
    /// `primitive_check(primitive, best_toi)` must return the time of impact of the ray
    /// with the given primitive if it is smaller than `best_toi`. Subtrees the ray cannot
    /// reach before the best time of impact found so far are skipped, and closer children
    /// are visited first.
    ///
    /// Returns the primitive hit first, and the time of impact.
    pub fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: Real,
        mut primitive_check: impl FnMut(u32, Real) -> Option<Real>,
    ) -> Option<(u32, Real)> {
        let mut best: Option<(u32, Real)> = None;
        let mut best_toi = max_toi;
        let mut stack = Self::traversal_stack();

        if let Some(root) = self.nodes.first() {
            if root.aabb.intersects_local_ray(ray, max_toi) {
                stack.push(0);
            }
        }

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];

            match node.kind {
                BvhNodeKind::Leaf { .. } => {
                    for primitive in self.leaf_primitives(node) {
                        if let Some(toi) = primitive_check(*primitive, best_toi) {
                            if toi <= best_toi {
                                best_toi = toi;
                                best = Some((*primitive, toi));
                            }
                        }
                    }
                }
                BvhNodeKind::Internal { left, right } => {
                    let left_toi = self.nodes[left as usize]
                        .aabb
                        .cast_local_ray(ray, best_toi, true);
                    let right_toi = self.nodes[right as usize]
                        .aabb
                        .cast_local_ray(ray, best_toi, true);

                    match (left_toi, right_toi) {
                        (Some(l), Some(r)) => {
                            // Push the farthest first so the closest is popped first.
                            if l <= r {
                                stack.push(right);
                                stack.push(left);
                            } else {
                                stack.push(left);
                                stack.push(right);
                            }
                        }
                        (Some(_), None) => stack.push(left),
                        (None, Some(_)) => stack.push(right),
                        (None, None) => {}
                    }
                }
            }
        }

        best
    }

    /// Finds the primitive maximizing a support function along `dir`.
    ///
    /// `primitive_support(primitive)` returns the largest value of `dir . p` over the points
    /// `p` of that primitive. Nodes are visited best-first, ordered by the support value of
    /// their AABB, and the search stops as soon as no remaining node can beat the best
    /// primitive found.
    pub fn support_primitive(
        &self,
        dir: &Vector<Real>,
        mut primitive_support: impl FnMut(u32) -> Real,
    ) -> Option<(u32, Real)> {
        let root = self.nodes.first()?;
        let mut queue = BinaryHeap::new();
        let mut best: Option<(u32, Real)> = None;

        queue.push((OrderedFloat(root.aabb.support_value(dir)), 0u32));

        while let Some((OrderedFloat(bound), id)) = queue.pop() {
            if let Some((_, best_value)) = best {
                if bound <= best_value {
                    break;
                }
            }

            let node = &self.nodes[id as usize];

            match node.kind {
                BvhNodeKind::Leaf { .. } => {
                    for primitive in self.leaf_primitives(node) {
                        let value = primitive_support(*primitive);
                        if best.map(|(_, b)| value > b).unwrap_or(true) {
                            best = Some((*primitive, value));
                        }
                    }
                }
                BvhNodeKind::Internal { left, right } => {
                    for child in [left, right] {
                        let bound = self.nodes[child as usize].aabb.support_value(dir);
                        queue.push((OrderedFloat(bound), child));
                    }
                }
            }
        }

        best
    }
}
