//! A static bounding volume hierarchy over a set of primitives.
//!
//! The tree is built top-down by splitting primitives at the mean of their AABB centers
//! along the axis of largest variance. Leaves reference contiguous ranges of a shared
//! primitive index array, so the tree stores no per-primitive data besides that array.
//! An optional fitness pass then rotates nodes to reduce the total surface area of the
//! hierarchy, which speeds-up ray casts.

pub use bvh_traverse::{Leaves, TraversalAction};
pub use bvh_tree::{Bvh, BvhNode, BvhNodeKind, LEAF_CAPACITY};

mod bvh_build;
mod bvh_optimize;
mod bvh_queries;
mod bvh_traverse;
mod bvh_tree;
mod bvh_validation;

#[cfg(test)]
mod bvh_tests;
