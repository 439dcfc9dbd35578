//! Hierarchical approximate convex decomposition (HACD) of triangle meshes.
//!
//! The decomposition runs in four phases driven by [`Hacd`]:
//!
//! 1. [`Hacd::new`] copies the mesh, merges its coplanar triangles into convex polygons, and
//!    builds a [`ClusterGraph`] with one cluster per face. Faces that see each other at a
//!    short distance through the inside of the mesh are linked as well.
//! 2. [`Hacd::submit_initial_edge_costs`] measures the cost of merging every pair of
//!    adjacent clusters.
//! 3. [`Hacd::collapse_clusters`] repeatedly merges the cheapest pair, recording every merge
//!    in a [`LookAheadTree`].
//! 4. [`Hacd::finalize`] cuts the merge history into convex pieces and computes their convex
//!    hulls.
//!
//! Concavity measurements are submitted in batches to a [`TaskRunner`], which may evaluate
//! them in parallel.
//!
//! # Example
//!
//! ```
//! use hacd3d::math::Point;
//! use hacd3d::transformation::hacd::{Hacd, HacdParameters};
//!
//! let vertices = [
//!     Point::new(0.0, 0.0, 0.0),
//!     Point::new(1.0, 0.0, 0.0),
//!     Point::new(0.0, 1.0, 0.0),
//!     Point::new(0.0, 0.0, 1.0),
//! ];
//! let indices = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
//!
//! let decomposition =
//!     Hacd::decompose_trimesh(&vertices, &indices, &HacdParameters::default()).unwrap();
//! assert_eq!(decomposition.num_hulls(), 1);
//! ```

pub use self::cluster_graph::{
    AdjacencyKind, Cluster, ClusterEdge, ClusterFace, ClusterGraph, ClusterNode,
};
pub use self::concavity::{CONCAVITY_FLOOR, CONCAVITY_SCALE, CREASE_PENALTY};
pub use self::decomposition::ConvexDecomposition;
pub use self::error::HacdError;
pub use self::hacd::{Hacd, HacdState};
pub use self::look_ahead_tree::{LookAheadNode, LookAheadTree};
pub use self::pair_proxy::PairProxy;
pub use self::parameters::{HacdParameters, MergeStrategy};
pub use self::progress::{NoProgress, ProgressReporter};
#[cfg(feature = "parallel")]
pub use self::task_runner::RayonRunner;
pub use self::task_runner::{BatchHandle, SerialRunner, TaskRunner, TriangleTask};

mod cluster_graph;
mod concavity;
mod decomposition;
mod error;
mod hacd;
mod look_ahead_tree;
mod pair_proxy;
mod parameters;
mod progress;
mod task_runner;

use crate::transformation::half_edge::HalfEdgeMesh;

/// Computes the approximate convex decomposition of `mesh`.
///
/// This runs every phase of [`Hacd`] in sequence. Concavity measurements are evaluated by
/// `runner` and the advancement of the algorithm is reported to `progress`.
pub fn convex_decomposition(
    mesh: &HalfEdgeMesh,
    params: &HacdParameters,
    progress: &mut dyn ProgressReporter,
    runner: &dyn TaskRunner,
) -> Result<ConvexDecomposition, HacdError> {
    let mut hacd = Hacd::new(mesh, params, progress)?;
    hacd.submit_initial_edge_costs(runner, progress)?;
    hacd.collapse_clusters(runner, progress)?;
    hacd.finalize(progress)
}
