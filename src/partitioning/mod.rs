//! Spatial partitioning tools.

pub use self::aabb_polygon_soup::AabbPolygonSoup;
pub use self::bvh::{Bvh, BvhNode, BvhNodeKind, Leaves, TraversalAction, LEAF_CAPACITY};

mod aabb_polygon_soup;
mod bvh;
