use super::initial_mesh::try_get_initial_mesh;
use super::{ConvexHullError, TriangleFacet};
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::shape::Triangle;
use crate::transformation::convex_hull_utils::{
    indexed_support_point_id, indexed_support_point_nth, normalize,
};
use crate::utils;

/// A triangle of a [`ConvexHull`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HullFace {
    /// The counter-clockwise vertex indices of this face.
    pub indices: [u32; 3],
    /// `adj[i]` is the face sharing the edge `indices[i] -> indices[(i + 1) % 3]`.
    pub adj: [u32; 3],
    /// The outward unit normal of this face.
    pub normal: Vector<Real>,
}

/// The convex hull of a point cloud, with face adjacency.
///
/// A hull built from degenerate input has no faces and no points.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ConvexHull {
    pub(super) points: Vec<Point<Real>>,
    pub(super) faces: Vec<HullFace>,
    pub(super) aabb: Aabb,
    pub(super) diagonal: Real,
}

impl ConvexHull {
    /// Computes the convex hull of `points`.
    ///
    /// Points closer than `tolerance` to the current hull are absorbed instead of being
    /// added to it, and insertion stops once the hull has `max_vertices` vertices (at
    /// least 4). Degenerate input gives a hull with zero faces.
    pub fn new(points: &[Point<Real>], tolerance: Real, max_vertices: usize) -> Self {
        Self::try_new(points, tolerance, max_vertices).unwrap_or_else(|err| {
            log::trace!("Empty convex hull for {} points: {}", points.len(), err);
            Self::default()
        })
    }

    /// Computes the convex hull of `points`, reporting why it is degenerate if it is.
    pub fn try_new(
        points: &[Point<Real>],
        tolerance: Real,
        max_vertices: usize,
    ) -> Result<Self, ConvexHullError> {
        if points.len() < 4 {
            return Err(ConvexHullError::IncompleteInput);
        }

        if points
            .iter()
            .any(|pt| pt.coords.iter().any(|x| !x.is_finite()))
        {
            return Err(ConvexHullError::NonFiniteInput);
        }

        let mut normalized_points = points.to_vec();
        let (_, diag) = normalize(&mut normalized_points[..]);
        let tolerance = if diag > 0.0 {
            tolerance.max(0.0) / diag
        } else {
            0.0
        };

        let mut undecidable_points = Vec::new();
        let mut triangles = try_get_initial_mesh(&normalized_points, &mut undecidable_points)?;

        let max_vertices = max_vertices.max(4);
        let mut num_vertices = 3;
        let mut silhouette_loop_facets_and_idx = Vec::new();
        let mut removed_facets = Vec::new();

        let mut i = 0;
        while i != triangles.len() && num_vertices < max_vertices {
            silhouette_loop_facets_and_idx.clear();

            if !triangles[i].valid || triangles[i].affinely_dependent {
                i += 1;
                continue;
            }

            let pt_id = indexed_support_point_id(
                &triangles[i].normal,
                &normalized_points[..],
                triangles[i].visible_points.iter().copied(),
            );

            // Points within the tolerance are absorbed by the current facet, except for the
            // first insertion that turns the initial triangle into a tetrahedron.
            let point = match pt_id {
                Some(point)
                    if num_vertices == 3
                        || triangles[i].distance_to_point(point, &normalized_points)
                            > tolerance =>
                {
                    point
                }
                _ => {
                    i += 1;
                    continue;
                }
            };

            triangles[i].valid = false;

            removed_facets.clear();
            removed_facets.push(i);

            for j in 0usize..3 {
                compute_silhouette(
                    triangles[i].adj[j],
                    triangles[i].indirect_adj_id[j],
                    point,
                    &mut silhouette_loop_facets_and_idx,
                    &normalized_points[..],
                    &mut removed_facets,
                    &mut triangles[..],
                );
            }

            // In some degenerate cases (because of float rounding problems), the silhouette may:
            // 1. Contain self-intersections (i.e. a single vertex is used by more than two edges).
            // 2. Contain multiple disjoint (but nested) loops.
            fix_silhouette_topology(
                &normalized_points,
                &mut silhouette_loop_facets_and_idx,
                &mut removed_facets,
                &mut triangles[..],
            );

            if silhouette_loop_facets_and_idx.is_empty() {
                // Due to inaccuracies, the silhouette could not be computed (the point seems
                // to be visible from every triangle). Keep the hull built so far.
                log::debug!(
                    "Convex hull: no silhouette for point {}, stopping at {} vertices.",
                    point,
                    num_vertices
                );

                for facet in &removed_facets {
                    triangles[*facet].valid = true;
                }

                break;
            }

            attach_and_push_facets(
                &silhouette_loop_facets_and_idx[..],
                point,
                &normalized_points[..],
                &mut triangles,
                &removed_facets[..],
                &mut undecidable_points,
            );

            num_vertices += 1;
            i += 1;
        }

        Ok(Self::from_facets(points, &triangles))
    }

    fn from_facets(points: &[Point<Real>], triangles: &[TriangleFacet]) -> Self {
        let mut remap = vec![u32::MAX; triangles.len()];
        let mut idx = Vec::new();

        for (i, facet) in triangles.iter().enumerate() {
            if facet.valid {
                remap[i] = idx.len() as u32;
                idx.push([
                    facet.pts[0] as u32,
                    facet.pts[1] as u32,
                    facet.pts[2] as u32,
                ]);
            }
        }

        let mut points = points.to_vec();
        utils::remove_unused_points(&mut points, &mut idx[..]);

        let faces: Vec<_> = triangles
            .iter()
            .filter(|facet| facet.valid)
            .zip(idx)
            .map(|(facet, indices)| {
                debug_assert!(facet.adj.iter().all(|adj| remap[*adj] != u32::MAX));
                let tri = Triangle::new(
                    points[indices[0] as usize],
                    points[indices[1] as usize],
                    points[indices[2] as usize],
                );

                HullFace {
                    indices,
                    adj: facet.adj.map(|adj| remap[adj]),
                    normal: tri.normal().map(|n| n.into_inner()).unwrap_or(facet.normal),
                }
            })
            .collect();

        let aabb = Aabb::from_points(&points);
        let diagonal = if points.is_empty() {
            0.0
        } else {
            aabb.diagonal()
        };

        ConvexHull {
            points,
            faces,
            aabb,
            diagonal,
        }
    }

    /// The vertices of this hull.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.points
    }

    /// The triangular faces of this hull, with their adjacency.
    #[inline]
    pub fn faces(&self) -> &[HullFace] {
        &self.faces
    }

    /// The counter-clockwise vertex indices of every face.
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = [u32; 3]> + '_ {
        self.faces.iter().map(|face| face.indices)
    }

    /// The `i`-th face of this hull as a triangle.
    #[inline]
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.faces[i].indices;
        Triangle::new(
            self.points[a as usize],
            self.points[b as usize],
            self.points[c as usize],
        )
    }

    /// Does this hull have no faces?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The bounding box of this hull.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The length of the diagonal of the bounding box of this hull.
    #[inline]
    pub fn diagonal(&self) -> Real {
        self.diagonal
    }

    /// Consumes this hull, returning its vertex and index buffers.
    pub fn into_mesh(self) -> (Vec<Point<Real>>, Vec<[u32; 3]>) {
        let indices = self.faces.iter().map(|face| face.indices).collect();
        (self.points, indices)
    }
}

fn compute_silhouette(
    facet: usize,
    indirect_id: usize,
    point: usize,
    out_facets_and_idx: &mut Vec<(usize, usize)>,
    points: &[Point<Real>],
    removed_facets: &mut Vec<usize>,
    triangles: &mut [TriangleFacet],
) {
    if triangles[facet].valid {
        if !triangles[facet].order_independent_can_be_seen_by_point(point, points) {
            out_facets_and_idx.push((facet, indirect_id));
        } else {
            triangles[facet].valid = false; // The facet must be removed from the convex hull.
            removed_facets.push(facet);

            compute_silhouette(
                triangles[facet].adj[(indirect_id + 1) % 3],
                triangles[facet].indirect_adj_id[(indirect_id + 1) % 3],
                point,
                out_facets_and_idx,
                points,
                removed_facets,
                triangles,
            );

            compute_silhouette(
                triangles[facet].adj[(indirect_id + 2) % 3],
                triangles[facet].indirect_adj_id[(indirect_id + 2) % 3],
                point,
                out_facets_and_idx,
                points,
                removed_facets,
                triangles,
            );
        }
    }
}

fn fix_silhouette_topology(
    points: &[Point<Real>],
    out_facets_and_idx: &mut Vec<(usize, usize)>,
    removed_facets: &mut Vec<usize>,
    triangles: &mut [TriangleFacet],
) {
    let mut workspace = vec![0; points.len()];
    let mut needs_fixing = false;

    // NOTE: we work with the second_point_from_edge instead
    // of the first one, because when we traverse the silhouette
    // we see the second edge point before the first.
    for (facet, adj_id) in &*out_facets_and_idx {
        let p = triangles[*facet].second_point_from_edge(*adj_id);
        workspace[p] += 1;

        if workspace[p] > 1 {
            needs_fixing = true;
        }
    }

    // We detected a topological problem, i.e., we have
    // multiple loops.
    if needs_fixing {
        // First, we need to know which loop is the one we
        // need to keep.
        let mut loop_start = 0;
        for (facet, adj_id) in &*out_facets_and_idx {
            let p1 = points[triangles[*facet].second_point_from_edge(*adj_id)];
            let p2 = points[triangles[*facet].first_point_from_edge(*adj_id)];
            let Some(supp) = indexed_support_point_nth(
                &(p2 - p1),
                points,
                out_facets_and_idx
                    .iter()
                    .map(|(f, ai)| triangles[*f].second_point_from_edge(*ai)),
            ) else {
                continue;
            };

            let selected = &out_facets_and_idx[supp];
            if workspace[triangles[selected.0].second_point_from_edge(selected.1)] == 1 {
                // This is a valid point to start with.
                loop_start = supp;
                break;
            }
        }

        let mut removing = None;
        let old_facets_and_idx = core::mem::take(out_facets_and_idx);

        for i in 0..old_facets_and_idx.len() {
            let facet_id = (loop_start + i) % old_facets_and_idx.len();
            let (facet, adj_id) = old_facets_and_idx[facet_id];
            let p1 = triangles[facet].second_point_from_edge(adj_id);

            match removing {
                Some(p) => {
                    if p == p1 {
                        removing = None;
                    }
                }
                _ => {
                    if workspace[p1] > 1 {
                        removing = Some(p1);
                    }
                }
            }

            if removing.is_some() {
                if triangles[facet].valid {
                    triangles[facet].valid = false;
                    removed_facets.push(facet);
                }
            } else {
                out_facets_and_idx.push((facet, adj_id));
            }
        }
    }
}

fn attach_and_push_facets(
    silhouette_loop_facets_and_idx: &[(usize, usize)],
    point: usize,
    points: &[Point<Real>],
    triangles: &mut Vec<TriangleFacet>,
    removed_facets: &[usize],
    undecidable: &mut Vec<usize>,
) {
    // The silhouette is built to be in CCW order.
    let mut new_facets: Vec<_> = silhouette_loop_facets_and_idx
        .iter()
        .map(|(adj_facet, indirect_id)| {
            TriangleFacet::new(
                point,
                triangles[*adj_facet].second_point_from_edge(*indirect_id),
                triangles[*adj_facet].first_point_from_edge(*indirect_id),
                points,
            )
        })
        .collect();

    // Link the facets together.
    let num_new = silhouette_loop_facets_and_idx.len();
    for i in 0..num_new {
        let prev_facet = triangles.len() + (i + num_new - 1) % num_new;
        let (middle_facet, middle_id) = silhouette_loop_facets_and_idx[i];
        let next_facet = triangles.len() + (i + 1) % num_new;

        new_facets[i].set_facets_adjacency([prev_facet, middle_facet, next_facet], [2, middle_id, 0]);
        // Check that we are not overwriting a valid link.
        debug_assert!(!triangles[triangles[middle_facet].adj[middle_id]].valid);
        triangles[middle_facet].adj[middle_id] = triangles.len() + i; // The future id of curr_facet.
        triangles[middle_facet].indirect_adj_id[middle_id] = 1;
    }

    // Assign to each facets some of the points which can see it.
    for curr_facet in removed_facets.iter() {
        for visible_point in triangles[*curr_facet].visible_points.iter() {
            if points[*visible_point] == points[point] {
                continue;
            }

            let mut furthest = None;
            let mut furthest_dist = 0.0;

            for (i, curr_facet) in new_facets.iter().enumerate() {
                if !curr_facet.affinely_dependent {
                    let distance = curr_facet.distance_to_point(*visible_point, points);

                    if distance > furthest_dist {
                        furthest = Some(i);
                        furthest_dist = distance;
                    }
                }
            }

            if let Some(furthest) = furthest {
                if new_facets[furthest].can_see_point(*visible_point, points) {
                    new_facets[furthest].add_visible_point(*visible_point, points);
                }
            }

            // If none of the facet can be seen from the point, it is implicitly
            // deleted because it won't be referenced by any facet.
        }
    }

    // Try to assign collinear points to one of the new facets.
    let mut i = 0;

    while i != undecidable.len() {
        let mut furthest = None;
        let mut furthest_dist = 0.0;
        let undecidable_point = undecidable[i];

        for (j, curr_facet) in new_facets.iter().enumerate() {
            if curr_facet.can_see_point(undecidable_point, points) {
                let distance = curr_facet.distance_to_point(undecidable_point, points);

                if distance > furthest_dist {
                    furthest = Some(j);
                    furthest_dist = distance;
                }
            }
        }

        if let Some(furthest) = furthest {
            new_facets[furthest].add_visible_point(undecidable_point, points);
            let _ = undecidable.swap_remove(i);
        } else {
            i += 1;
        }
    }

    triangles.append(&mut new_facets);
}
