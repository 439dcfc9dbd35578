//! Hertel-Mehlhorn convex partitioning of the faces of a half-edge mesh.

use super::{EdgeId, HalfEdgeMesh};
use crate::math::{Real, Vector};

/// Faces whose unit normals have a dot product above this value are coplanar.
const COPLANARITY_THRESHOLD: Real = 1.0 - 1.0e-6;

impl HalfEdgeMesh {
    /// Splits every face into convex polygons.
    ///
    /// Faces are triangulated first. Then every edge between two coplanar faces is removed
    /// unless it is essential, i.e., unless removing it would make one of its endpoints a
    /// reflex corner of the merged face.
    pub fn convex_partition(&mut self) {
        self.triangulate();

        let edges: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(id, e)| e.face.is_some() && *id < e.twin)
            .map(|(id, _)| id)
            .collect();

        for edge in edges {
            if !self.edges.contains(edge) || !self.is_inessential(edge) {
                continue;
            }

            let _ = self.delete_edge(edge);
        }
    }

    fn is_inessential(&self, edge: EdgeId) -> bool {
        let h = &self.edges[edge];
        let t = &self.edges[h.twin];

        if h.face.is_none() || t.face.is_none() || self.face_loop(edge).any(|e| e == h.twin) {
            return false;
        }

        let (Some(n1), Some(n2)) = (
            self.face_normal(edge).try_normalize(0.0),
            self.face_normal(h.twin).try_normalize(0.0),
        ) else {
            return false;
        };

        if n1.dot(&n2) < COPLANARITY_THRESHOLD {
            return false;
        }

        // Corners of the merged face at both endpoints of the removed edge.
        let vertex = |e: EdgeId| self.vertices[self.edges[e].vertex as usize];
        let corner_is_convex = |incoming: EdgeId, outgoing: EdgeId| {
            let a = vertex(incoming);
            let b = vertex(outgoing);
            let c = vertex(self.edges[outgoing].next);
            let (ab, bc) = (b - a, c - b);
            is_convex_turn(&ab, &bc, &n1)
        };

        corner_is_convex(h.prev, t.next) && corner_is_convex(t.prev, h.next)
    }
}

fn is_convex_turn(ab: &Vector<Real>, bc: &Vector<Real>, normal: &Vector<Real>) -> bool {
    ab.cross(bc).dot(normal) >= -1.0e-9 * ab.norm() * bc.norm()
}
