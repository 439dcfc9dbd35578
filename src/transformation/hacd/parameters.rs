use crate::math::Real;

/// When the merge loop of [`Hacd`](super::Hacd) stops.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum MergeStrategy {
    /// Merge until a single cluster remains per connected component, then cut the merge
    /// history at the requested granularity.
    #[default]
    Hierarchical,
    /// Stop merging as soon as the cluster count is at most `max_clusters` and the cheapest
    /// remaining merge exceeds the concavity limit.
    Greedy,
}

/// Parameters of the hierarchical approximate convex decomposition.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HacdParameters {
    /// The maximum concavity of an output piece, as a fraction of the diagonal of the
    /// input mesh AABB.
    ///
    /// Default: `0.2`
    pub max_concavity: Real,
    /// The maximum number of output convex pieces.
    ///
    /// Default: `16`
    pub max_clusters: usize,
    /// The maximum number of vertices of each output convex hull.
    ///
    /// Default: `64`
    pub max_vertices_per_hull: usize,
    /// The distance, as a fraction of the diagonal of the input mesh AABB, under which two
    /// faces facing each other through the inside of the mesh are considered adjacent.
    ///
    /// Default: `0.2`
    pub back_face_distance_factor: Real,
    /// The termination rule of the merge loop.
    ///
    /// Default: [`MergeStrategy::Hierarchical`]
    pub strategy: MergeStrategy,
}

impl Default for HacdParameters {
    fn default() -> Self {
        Self {
            max_concavity: 0.2,
            max_clusters: 16,
            max_vertices_per_hull: 64,
            back_face_distance_factor: 0.2,
            strategy: MergeStrategy::Hierarchical,
        }
    }
}

impl HacdParameters {
    /// A copy of these parameters with every field clamped to its valid range.
    pub fn sanitized(&self) -> Self {
        let max_concavity = if self.max_concavity.is_nan() {
            1.0e-5
        } else {
            self.max_concavity.max(1.0e-5)
        };
        let back_face_distance_factor = if self.back_face_distance_factor.is_nan() {
            0.01
        } else {
            self.back_face_distance_factor.clamp(0.01, 1.0)
        };

        Self {
            max_concavity,
            max_clusters: self.max_clusters.max(1),
            max_vertices_per_hull: self.max_vertices_per_hull.max(4),
            back_face_distance_factor,
            strategy: self.strategy,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{HacdParameters, MergeStrategy};

    #[test]
    fn sanitize_parameters() {
        let params = HacdParameters {
            max_concavity: -1.0,
            max_clusters: 0,
            max_vertices_per_hull: 2,
            back_face_distance_factor: 3.0,
            strategy: MergeStrategy::Greedy,
        }
        .sanitized();

        assert_eq!(params.max_concavity, 1.0e-5);
        assert_eq!(params.max_clusters, 1);
        assert_eq!(params.max_vertices_per_hull, 4);
        assert_eq!(params.back_face_distance_factor, 1.0);
        assert_eq!(params.strategy, MergeStrategy::Greedy);

        let default = HacdParameters::default();
        assert_eq!(default.sanitized(), default);
    }
}
