//! Transformation, simplification and decomposition of meshes.

pub use self::convex_hull3::{
    check_convex_hull, check_hull_adjacency, ConvexHull, ConvexHullError, HullFace, NO_HIT,
};

mod convex_hull3;
pub(crate) mod convex_hull_utils;

pub mod hacd;
pub mod half_edge;
pub mod polygon_soup;

#[cfg(feature = "wavefront")]
pub mod wavefront;
