use super::half_edge_mesh::NO_EDGE;
use super::{EdgeId, HalfEdge, HalfEdgeMesh, HalfEdgeMeshError};
use crate::math::{Point, Real};
use smallvec::SmallVec;

impl HalfEdgeMesh {
    fn check_edge(&self, edge: EdgeId) -> Result<&HalfEdge, HalfEdgeMeshError> {
        self.edges
            .get(edge)
            .filter(|e| e.twin != NO_EDGE)
            .ok_or(HalfEdgeMeshError::InvalidEdge(edge))
    }

    /// Splits the edge `edge` at the parameter `t ∈ [0, 1]` along it.
    ///
    /// The new vertex is interpolated between the endpoints, and so are the corner attributes
    /// on both sides of the edge. Returns the half-edge going from the origin of `edge` to the
    /// new vertex, which is `edge` itself.
    pub fn insert_edge_vertex(&mut self, edge: EdgeId, t: Real) -> Result<EdgeId, HalfEdgeMeshError> {
        let _ = self.check_edge(edge)?;
        let a = self.vertices[self.edges[edge].vertex as usize];
        let b = self.vertices[self.dest(edge) as usize];
        let t = na::clamp(t, 0.0, 1.0);
        let vertex = self.add_vertex(a + (b - a) * t);

        self.split_edge_at(edge, vertex, t).inspect_err(|_| {
            let _ = self.vertices.pop();
        })
    }

    /// Splits the edge `edge` at the projection of `point` on it.
    ///
    /// The new vertex is placed at `point`.
    pub fn split_edge(
        &mut self,
        edge: EdgeId,
        point: Point<Real>,
    ) -> Result<EdgeId, HalfEdgeMeshError> {
        let _ = self.check_edge(edge)?;
        let a = self.vertices[self.edges[edge].vertex as usize];
        let b = self.vertices[self.dest(edge) as usize];
        let ab = b - a;
        let t = if ab.norm_squared() > 0.0 {
            na::clamp((point - a).dot(&ab) / ab.norm_squared(), 0.0, 1.0)
        } else {
            0.5
        };
        let vertex = self.add_vertex(point);

        self.split_edge_at(edge, vertex, t).inspect_err(|_| {
            let _ = self.vertices.pop();
        })
    }

    /// Splits `edge` at the existing vertex `vertex`, located at the parameter `t` along it.
    pub(super) fn split_edge_at(
        &mut self,
        edge: EdgeId,
        vertex: u32,
        t: Real,
    ) -> Result<EdgeId, HalfEdgeMeshError> {
        let e = *self.check_edge(edge)?;
        let twin = e.twin;
        let f = self.edges[twin];
        let (from, to) = (e.vertex, f.vertex);

        if vertex as usize >= self.vertices.len() {
            return Err(HalfEdgeMeshError::InvalidVertex(vertex));
        }

        if vertex == from || vertex == to {
            return Err(HalfEdgeMeshError::DegenerateFace);
        }

        for (side, a, b) in [(e, from, vertex), (e, vertex, to), (f, to, vertex), (f, vertex, from)] {
            if side.face.is_some() && self.edge_map.contains_key(&(a, b)) {
                return Err(HalfEdgeMeshError::NonManifoldEdge { from: a, to: b });
            }
        }

        let attr_e = self.lerp_attributes(e.attribute, self.edges[e.next].attribute, t);
        let attr_f = self.lerp_attributes(f.attribute, self.edges[f.next].attribute, 1.0 - t);

        // `edge` side: from -> vertex -> to.
        let e2 = self.edges.insert(HalfEdge {
            vertex,
            twin,
            next: e.next,
            prev: edge,
            face: e.face,
            attribute: attr_e,
            mark: 0,
        });
        self.edges[e.next].prev = e2;
        self.edges[edge].next = e2;

        // Twin side: to -> vertex -> from.
        let f_next = self.edges[twin].next;
        let f2 = self.edges.insert(HalfEdge {
            vertex,
            twin: edge,
            next: f_next,
            prev: twin,
            face: f.face,
            attribute: attr_f,
            mark: 0,
        });
        self.edges[f_next].prev = f2;
        self.edges[twin].next = f2;
        self.edges[twin].twin = e2;
        self.edges[edge].twin = f2;

        if e.face.is_some() {
            let _ = self.edge_map.remove(&(from, to));
            let _ = self.edge_map.insert((from, vertex), edge);
            let _ = self.edge_map.insert((vertex, to), e2);
        }

        if f.face.is_some() {
            let _ = self.edge_map.remove(&(to, from));
            let _ = self.edge_map.insert((to, vertex), twin);
            let _ = self.edge_map.insert((vertex, from), f2);
        }

        Ok(edge)
    }

    fn lerp_attributes(&mut self, a: u32, b: u32, t: Real) -> u32 {
        let attribute = match (self.attributes.get(a as usize), self.attributes.get(b as usize)) {
            (Some(a), Some(b)) => a.lerp(b, t),
            (Some(a), None) => *a,
            _ => Default::default(),
        };
        self.attributes.push(attribute);
        self.attributes.len() as u32 - 1
    }

    /// Removes the face `edge` belongs to.
    ///
    /// Its half-edges become boundary half-edges. Edges left without any incident face are
    /// removed, and the boundary loops around them are spliced.
    pub fn delete_face(&mut self, edge: EdgeId) -> Result<(), HalfEdgeMeshError> {
        if self.check_edge(edge)?.face.is_none() {
            return Err(HalfEdgeMeshError::InvalidEdge(edge));
        }

        let edges: SmallVec<[EdgeId; 8]> = self.face_loop(edge).collect();

        for e in &edges {
            let from = self.edges[*e].vertex;
            let to = self.dest(*e);
            let _ = self.edge_map.remove(&(from, to));
            self.edges[*e].face = None;
        }

        for e in edges {
            let Some(h) = self.edges.get(e).copied() else {
                continue;
            };

            if self.edges[h.twin].face.is_some() {
                continue;
            }

            let t = self.edges[h.twin];
            let twin = h.twin;

            match (h.next == twin, t.next == e) {
                (true, true) => {}
                (true, false) => {
                    self.edges[h.prev].next = t.next;
                    self.edges[t.next].prev = h.prev;
                }
                (false, true) => {
                    self.edges[t.prev].next = h.next;
                    self.edges[h.next].prev = t.prev;
                }
                (false, false) => {
                    self.edges[h.prev].next = t.next;
                    self.edges[t.next].prev = h.prev;
                    self.edges[t.prev].next = h.next;
                    self.edges[h.next].prev = t.prev;
                }
            }

            let _ = self.edges.remove(e);
            let _ = self.edges.remove(twin);
        }

        self.num_faces -= 1;
        Ok(())
    }

    /// Removes the edge `edge`, merging the two faces on its sides.
    ///
    /// The merged face keeps the color of the face of `edge`. Returns a half-edge of the
    /// merged face.
    pub fn delete_edge(&mut self, edge: EdgeId) -> Result<EdgeId, HalfEdgeMeshError> {
        let h = *self.check_edge(edge)?;
        let t = self.edges[h.twin];

        let (Some(face), Some(_)) = (h.face, t.face) else {
            return Err(HalfEdgeMeshError::InvalidEdge(edge));
        };

        if self.face_loop(edge).any(|e| e == h.twin) {
            return Err(HalfEdgeMeshError::InvalidEdge(edge));
        }

        self.recolor_face(h.twin, face);

        self.edges[h.prev].next = t.next;
        self.edges[t.next].prev = h.prev;
        self.edges[t.prev].next = h.next;
        self.edges[h.next].prev = t.prev;

        let _ = self.edge_map.remove(&(h.vertex, t.vertex));
        let _ = self.edge_map.remove(&(t.vertex, h.vertex));
        let _ = self.edges.remove(edge);
        let _ = self.edges.remove(h.twin);

        self.num_faces -= 1;
        Ok(h.prev)
    }

    /// Splits a face with a new edge from the origin of `e0` to the origin of `e1`.
    ///
    /// Both half-edges must belong to the same face and must not be consecutive. The new
    /// half-edge keeps the face of `e0` and is returned; its twin bounds a new face made of
    /// `e0` up to the half-edge preceding `e1`.
    pub fn connect_vertex(&mut self, e0: EdgeId, e1: EdgeId) -> Result<EdgeId, HalfEdgeMeshError> {
        let h0 = *self.check_edge(e0)?;
        let h1 = *self.check_edge(e1)?;

        let Some(face) = h0.face else {
            return Err(HalfEdgeMeshError::InvalidEdge(e0));
        };

        if e0 == e1 || h0.next == e1 || h1.next == e0 || !self.face_loop(e0).any(|e| e == e1) {
            return Err(HalfEdgeMeshError::InvalidEdge(e1));
        }

        let (from, to) = (h0.vertex, h1.vertex);

        if from == to {
            return Err(HalfEdgeMeshError::DegenerateFace);
        }

        for key in [(from, to), (to, from)] {
            if self.edge_map.contains_key(&key) {
                return Err(HalfEdgeMeshError::NonManifoldEdge {
                    from: key.0,
                    to: key.1,
                });
            }
        }

        let diagonal = self.edges.insert(HalfEdge {
            vertex: from,
            twin: NO_EDGE,
            next: e1,
            prev: h0.prev,
            face: Some(face),
            attribute: h0.attribute,
            mark: 0,
        });
        let twin = self.edges.insert(HalfEdge {
            vertex: to,
            twin: diagonal,
            next: e0,
            prev: h1.prev,
            face: Some(face),
            attribute: h1.attribute,
            mark: 0,
        });

        self.edges[diagonal].twin = twin;
        self.edges[h0.prev].next = diagonal;
        self.edges[e1].prev = diagonal;
        self.edges[h1.prev].next = twin;
        self.edges[e0].prev = twin;

        let _ = self.edge_map.insert((from, to), diagonal);
        let _ = self.edge_map.insert((to, from), twin);

        let new_face = self.next_face_id;
        self.next_face_id += 1;
        self.num_faces += 1;
        self.recolor_face(twin, new_face);

        Ok(diagonal)
    }
}
