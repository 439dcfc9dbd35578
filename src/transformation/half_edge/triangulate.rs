//! Ear-clipping triangulation of the faces of a half-edge mesh.
//! Based on <https://github.com/ivanfratric/polypartition>.

use super::{EdgeId, HalfEdgeMesh, HalfEdgeMeshError};
use crate::math::{Point, Real, Vector};
use crate::utils::point_in_triangle::{corner_direction, is_point_in_triangle, Orientation};
use na::Point2;
use smallvec::SmallVec;

/// The information stored for each vertex in the ear clipping algorithm.
#[derive(Clone, Default)]
struct VertexInfo {
    /// Whether the vertex is still active i.e. it has not been clipped yet.
    is_active: bool,
    /// Whether the vertex is the tip of an ear and can be clipped.
    is_ear: bool,
    /// How small the angle of the ear is. Ears with a smaller angle are clipped first.
    pointiness: Real,
    p_prev: usize,
    p_next: usize,
}

/// Updates the fields `pointiness` and `is_ear` for a given vertex index.
fn update_vertex(idx: usize, vertex_info: &mut VertexInfo, points: &[Point2<Real>]) {
    let p = points[idx];
    let p1 = points[vertex_info.p_prev];
    let p3 = points[vertex_info.p_next];

    let (Some(vec1), Some(vec3)) = ((p1 - p).try_normalize(0.0), (p3 - p).try_normalize(0.0))
    else {
        vertex_info.is_ear = false;
        return;
    };

    vertex_info.pointiness = vec1.dot(&vec3);

    // A point is an ear when it is convex and no other point lies inside, or on the border
    // of, the triangle spanned by it and its two neighbors.
    vertex_info.is_ear = corner_direction(&p1, &p, &p3) == Orientation::Ccw
        && (0..points.len())
            .filter(|&i| i != vertex_info.p_prev && i != idx && i != vertex_info.p_next)
            .filter(|&i| points[i] != p1 && points[i] != p && points[i] != p3)
            .all(|i| is_point_in_triangle(&points[i], &p1, &p, &p3) != Some(true));
}

/// Ear clipping of a counter-clockwise simple polygon.
///
/// Returns the clipped ears in clipping order as `[prev, tip, next]`, the last entry being
/// the remaining triangle. Returns `None` if an ear can't be found.
pub(super) fn clip_ears(vertices: &[Point2<Real>]) -> Option<Vec<[u32; 3]>> {
    let n_vertices = vertices.len();

    if n_vertices < 3 {
        return None;
    }

    let mut vertex_info = vec![VertexInfo::default(); n_vertices];

    for (i, info) in vertex_info.iter_mut().enumerate() {
        info.is_active = true;
        info.p_prev = if i == 0 { n_vertices - 1 } else { i - 1 };
        info.p_next = if i == n_vertices - 1 { 0 } else { i + 1 };
        update_vertex(i, info, vertices);
    }

    let mut output_indices = Vec::with_capacity(n_vertices - 2);

    for _ in 0..n_vertices - 3 {
        // Search through all active ears and pick out the pointiest.
        let (ear_i, _) = vertex_info
            .iter()
            .enumerate()
            .filter(|(_, info)| info.is_active && info.is_ear)
            .max_by(|(_, info1), (_, info2)| info1.pointiness.total_cmp(&info2.pointiness))?;

        vertex_info[ear_i].is_active = false;
        let VertexInfo { p_prev, p_next, .. } = vertex_info[ear_i];
        output_indices.push([p_prev as u32, ear_i as u32, p_next as u32]);

        vertex_info[p_prev].p_next = p_next;
        vertex_info[p_next].p_prev = p_prev;

        let mut prev_info = vertex_info[p_prev].clone();
        update_vertex(p_prev, &mut prev_info, vertices);
        vertex_info[p_prev] = prev_info;
        let mut next_info = vertex_info[p_next].clone();
        update_vertex(p_next, &mut next_info, vertices);
        vertex_info[p_next] = next_info;
    }

    let (i, info) = vertex_info
        .iter()
        .enumerate()
        .find(|(_, info)| info.is_active)?;
    output_indices.push([info.p_prev as u32, i as u32, info.p_next as u32]);

    Some(output_indices)
}

/// Projects points on the plane orthogonal to `normal`, preserving their winding around it.
pub(super) fn project_on_plane(points: &[Point<Real>], normal: &Vector<Real>) -> Vec<Point2<Real>> {
    let axis = normal.iamin();
    let u = normal.cross(&Vector::ith(axis, 1.0)).normalize();
    let v = normal.normalize().cross(&u);

    points
        .iter()
        .map(|pt| Point2::new(pt.coords.dot(&u), pt.coords.dot(&v)))
        .collect()
}

/// Triangulates a polygon given by its counter-clockwise loop around `normal`.
pub(super) fn triangulate_polygon(
    points: &[Point<Real>],
    normal: &Vector<Real>,
) -> Option<Vec<[u32; 3]>> {
    clip_ears(&project_on_plane(points, normal))
}

impl HalfEdgeMesh {
    /// Splits every face into triangles.
    ///
    /// Each face is projected on the plane orthogonal to its Newell normal and ear-clipped,
    /// pointiest ears first. A face that cannot be fully triangulated is left partially split.
    pub fn triangulate(&mut self) {
        for face in self.faces() {
            let _ = self.triangulate_face(face);
        }
    }

    /// Triangulates the face `edge` belongs to.
    ///
    /// Returns `false` if the face could not be fully triangulated.
    pub(super) fn triangulate_face(&mut self, edge: EdgeId) -> bool {
        let edges: SmallVec<[EdgeId; 8]> = self.face_loop(edge).collect();

        if edges.len() <= 3 {
            return true;
        }

        let normal = self.face_normal(edge);
        if normal.norm_squared() == 0.0 {
            log::debug!("Face {} has no well-defined normal, skipping it.", edge);
            return false;
        }

        let points: Vec<_> = edges
            .iter()
            .map(|e| self.vertices[self.edges[*e].vertex as usize])
            .collect();

        let Some(ears) = triangulate_polygon(&points, &normal) else {
            log::debug!("Could not find an ear on face {}.", edge);
            return false;
        };

        let mut current = edges;
        for [prev, _, next] in &ears[..ears.len() - 1] {
            match self.connect_vertex(current[*prev as usize], current[*next as usize]) {
                Ok(diagonal) => current[*prev as usize] = diagonal,
                Err(HalfEdgeMeshError::NonManifoldEdge { from, to }) => {
                    log::debug!("The diagonal ({}, {}) already exists.", from, to);
                    return false;
                }
                Err(_) => return false,
            }
        }

        true
    }
}
