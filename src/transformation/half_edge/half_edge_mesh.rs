use super::HalfEdgeMeshError;
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::shape::{newell_normal, PolygonSoup};
use crate::transformation::polygon_soup::weld_vertices;
use crate::utils::hashmap::HashMap;
use slab::Slab;
use smallvec::SmallVec;

/// The identifier of a half-edge: its key in the half-edge arena.
pub type EdgeId = usize;

/// Placeholder for a link that is not set yet.
pub(super) const NO_EDGE: EdgeId = usize::MAX;

/// Triangles whose doubled area is below the square root of this value are degenerate.
pub(super) const DEGENERATE_AREA_SQ: Real = 1.0e-12;

/// Per-corner data of a face: the value stored for the vertex a half-edge starts from.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct VertexAttribute {
    /// The shading normal.
    pub normal: Vector<Real>,
    /// The texture coordinates.
    pub uv: [Real; 2],
    /// The material tag of the face.
    pub material: u32,
}

impl Default for VertexAttribute {
    fn default() -> Self {
        VertexAttribute {
            normal: Vector::zeros(),
            uv: [0.0; 2],
            material: 0,
        }
    }
}

impl VertexAttribute {
    /// Linearly interpolates between `self` and `other`.
    ///
    /// The normal is renormalized and the material of `self` is kept.
    pub fn lerp(&self, other: &Self, t: Real) -> Self {
        let normal = self.normal.lerp(&other.normal, t);
        VertexAttribute {
            normal: normal.try_normalize(0.0).unwrap_or(normal),
            uv: [
                self.uv[0] + (other.uv[0] - self.uv[0]) * t,
                self.uv[1] + (other.uv[1] - self.uv[1]) * t,
            ],
            material: self.material,
        }
    }
}

/// A directed edge of a [`HalfEdgeMesh`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HalfEdge {
    /// The vertex this half-edge starts from.
    pub vertex: u32,
    /// The opposite half-edge.
    pub twin: EdgeId,
    /// The next half-edge of the same face loop.
    pub next: EdgeId,
    /// The previous half-edge of the same face loop.
    pub prev: EdgeId,
    /// The color of the face on the left of this half-edge, `None` on an open boundary.
    pub face: Option<u32>,
    /// The index of the attribute of the corner at `vertex`.
    pub attribute: u32,
    /// Scratch value for traversals.
    pub mark: u32,
}

/// A polygonal mesh with explicit half-edge connectivity.
///
/// Faces are the `next` loops of half-edges sharing the same `face` color. Every half-edge
/// has a twin: half-edges on the border of the surface are twinned with boundary half-edges
/// whose `face` is `None`, and boundary half-edges form their own loops.
///
/// Faces are added in `begin_face`/`add_face`/`end_face` blocks with indices into the
/// vertex buffer, or through the position-based `begin_polygon`/`add_polygon`/`end_polygon`
/// front-end which welds coincident positions.
#[derive(Clone, Debug, Default)]
pub struct HalfEdgeMesh {
    pub(super) vertices: Vec<Point<Real>>,
    pub(super) attributes: Vec<VertexAttribute>,
    pub(super) edges: Slab<HalfEdge>,
    /// The face half-edge of every directed edge `(from, to)`.
    pub(super) edge_map: HashMap<(u32, u32), EdgeId>,
    pub(super) pending: Vec<EdgeId>,
    pub(super) building: bool,
    pub(super) num_faces: usize,
    pub(super) next_face_id: u32,
    polygon_corners: Vec<(Point<Real>, VertexAttribute)>,
}

/// Iterator through the half-edges of a face loop, see [`HalfEdgeMesh::face_loop`].
pub struct FaceLoop<'a> {
    mesh: &'a HalfEdgeMesh,
    start: EdgeId,
    curr: Option<EdgeId>,
}

impl Iterator for FaceLoop<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let curr = self.curr?;
        let next = self.mesh.edges[curr].next;
        self.curr = if next == self.start { None } else { Some(next) };
        Some(curr)
    }
}

impl HalfEdgeMesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mesh with the given vertex buffer.
    pub fn with_vertices(vertices: Vec<Point<Real>>) -> Self {
        HalfEdgeMesh {
            vertices,
            ..Self::default()
        }
    }

    /// Appends a vertex, returning its index.
    pub fn add_vertex(&mut self, point: Point<Real>) -> u32 {
        self.vertices.push(point);
        self.vertices.len() as u32 - 1
    }

    /// The vertex buffer.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The per-corner attributes, indexed by [`HalfEdge::attribute`].
    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// The half-edge with the given id.
    ///
    /// Panics if it does not exist.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &HalfEdge {
        &self.edges[id]
    }

    /// Does the half-edge `id` exist?
    #[inline]
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(id)
    }

    /// Iterates through all the half-edges, boundary ones included.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &HalfEdge)> + '_ {
        self.edges.iter()
    }

    /// The number of half-edges, boundary ones included.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The vertex the half-edge `id` ends at.
    #[inline]
    pub fn dest(&self, id: EdgeId) -> u32 {
        self.edges[self.edges[id].next].vertex
    }

    /// The face half-edge going from `from` to `to`, if any.
    #[inline]
    pub fn find_edge(&self, from: u32, to: u32) -> Option<EdgeId> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// The number of faces of this mesh.
    #[inline]
    pub fn total_face_count(&self) -> usize {
        self.num_faces
    }

    /// Starts adding faces.
    ///
    /// Boundary half-edges are dissolved so the new faces can be glued to the existing ones.
    pub fn begin_face(&mut self) {
        if self.building {
            return;
        }

        self.building = true;
        let boundary: Vec<_> = self
            .edges
            .iter()
            .filter(|(_, e)| e.face.is_none())
            .map(|(id, _)| id)
            .collect();

        for id in boundary {
            let twin = self.edges.remove(id).twin;
            if let Some(edge) = self.edges.get_mut(twin) {
                edge.twin = NO_EDGE;
                self.pending.push(twin);
            }
        }
    }

    /// Adds a face given by the vertex indices of its counter-clockwise loop.
    ///
    /// `attributes` gives one attribute per corner. If it is `None`, every corner gets the
    /// face normal and the material 0. Returns the half-edge starting at `indices[0]`.
    pub fn add_face(
        &mut self,
        indices: &[u32],
        attributes: Option<&[VertexAttribute]>,
    ) -> Result<EdgeId, HalfEdgeMeshError> {
        if !self.building {
            return Err(HalfEdgeMeshError::NotBuilding);
        }

        if indices.len() < 3 {
            return Err(HalfEdgeMeshError::DegenerateFace);
        }

        if let Some(i) = indices.iter().find(|i| **i as usize >= self.vertices.len()) {
            return Err(HalfEdgeMeshError::InvalidVertex(*i));
        }

        for (k, i) in indices.iter().enumerate() {
            if indices[k + 1..].contains(i) {
                return Err(HalfEdgeMeshError::DegenerateFace);
            }
        }

        for k in 0..indices.len() {
            let from = indices[k];
            let to = indices[(k + 1) % indices.len()];

            if self.edge_map.contains_key(&(from, to)) {
                return Err(HalfEdgeMeshError::NonManifoldEdge { from, to });
            }
        }

        let default_attribute = VertexAttribute {
            normal: newell_normal(indices.iter().map(|i| &self.vertices[*i as usize]))
                .try_normalize(0.0)
                .unwrap_or_else(Vector::zeros),
            ..VertexAttribute::default()
        };

        let face = self.next_face_id;
        self.next_face_id += 1;
        self.num_faces += 1;

        let ids: SmallVec<[EdgeId; 8]> = indices
            .iter()
            .enumerate()
            .map(|(k, vertex)| {
                let attribute = attributes
                    .and_then(|attrs| attrs.get(k))
                    .copied()
                    .unwrap_or(default_attribute);
                self.attributes.push(attribute);

                self.edges.insert(HalfEdge {
                    vertex: *vertex,
                    twin: NO_EDGE,
                    next: NO_EDGE,
                    prev: NO_EDGE,
                    face: Some(face),
                    attribute: self.attributes.len() as u32 - 1,
                    mark: 0,
                })
            })
            .collect();

        let n = ids.len();
        for k in 0..n {
            let edge = &mut self.edges[ids[k]];
            edge.next = ids[(k + 1) % n];
            edge.prev = ids[(k + n - 1) % n];
            let _ = self
                .edge_map
                .insert((indices[k], indices[(k + 1) % n]), ids[k]);
        }

        self.pending.extend_from_slice(&ids);
        Ok(ids[0])
    }

    /// Finishes adding faces: links the twins and closes open borders with boundary loops.
    pub fn end_face(&mut self) {
        let pending = core::mem::take(&mut self.pending);
        let mut unmatched = Vec::new();

        for id in pending {
            if !self.edges.contains(id) || self.edges[id].twin != NO_EDGE {
                continue;
            }

            let from = self.edges[id].vertex;
            let to = self.dest(id);

            match self.edge_map.get(&(to, from)).copied() {
                Some(twin) if self.edges[twin].twin == NO_EDGE => {
                    self.edges[id].twin = twin;
                    self.edges[twin].twin = id;
                }
                _ => unmatched.push(id),
            }
        }

        let boundary: Vec<_> = unmatched
            .iter()
            .map(|id| {
                let next = self.edges[*id].next;
                let boundary = self.edges.insert(HalfEdge {
                    vertex: self.edges[next].vertex,
                    twin: *id,
                    next: NO_EDGE,
                    prev: NO_EDGE,
                    face: None,
                    attribute: self.edges[next].attribute,
                    mark: 0,
                });
                self.edges[*id].twin = boundary;
                boundary
            })
            .collect();

        for b in boundary {
            // The boundary half-edge leaving the end of `b`, found by rotating around it
            // through the faces.
            let mut h = self.edges[b].twin;
            for _ in 0..self.edges.len() {
                let candidate = self.edges[self.edges[h].prev].twin;
                if self.edges[candidate].face.is_none() {
                    self.edges[b].next = candidate;
                    self.edges[candidate].prev = b;
                    break;
                }
                h = candidate;
            }
        }

        self.building = false;
    }

    /// Removes every face, vertex and attribute, and starts adding polygons with
    /// [`Self::add_polygon`].
    pub fn begin_polygon(&mut self) {
        *self = Self::default();
        self.begin_face();
    }

    /// Adds a polygon given by the positions of its counter-clockwise loop.
    ///
    /// Polygons with more than three vertices are triangulated. Degenerate triangles are
    /// rejected. Returns the number of triangles queued, which are only added to the mesh
    /// by [`Self::end_polygon`].
    pub fn add_polygon(&mut self, points: &[Point<Real>], material: u32) -> usize {
        let Some(normal) = newell_normal(points).try_normalize(0.0) else {
            return 0;
        };

        let triangles = match points.len() {
            0..=2 => return 0,
            3 => vec![[0, 1, 2]],
            _ => match super::triangulate::triangulate_polygon(points, &normal) {
                Some(triangles) => triangles,
                None => return 0,
            },
        };

        let attribute = VertexAttribute {
            normal,
            material,
            ..VertexAttribute::default()
        };

        let mut added = 0;
        for tri in triangles {
            let [a, b, c] = tri.map(|i| points[i as usize]);

            if (b - a).cross(&(c - a)).norm_squared() > DEGENERATE_AREA_SQ {
                self.polygon_corners
                    .extend([a, b, c].map(|pt| (pt, attribute)));
                added += 1;
            }
        }

        added
    }

    /// Welds the queued polygons within `tolerance` and builds their connectivity.
    ///
    /// A triangle that would share a directed edge with another face gets its own copy of
    /// its vertices. T-joints are repaired afterwards.
    pub fn end_polygon(&mut self, tolerance: Real) {
        let corners = core::mem::take(&mut self.polygon_corners);
        let positions: Vec<_> = corners.iter().map(|c| c.0).collect();
        let (welded, remap) = weld_vertices(&positions, tolerance);
        let base = self.vertices.len() as u32;
        self.vertices.extend(welded);
        self.begin_face();

        for (tri, corners) in remap.chunks_exact(3).zip(corners.chunks_exact(3)) {
            let idx = [tri[0] + base, tri[1] + base, tri[2] + base];
            let [a, b, c] = idx.map(|i| self.vertices[i as usize]);

            if (b - a).cross(&(c - a)).norm_squared() <= DEGENERATE_AREA_SQ {
                continue;
            }

            let attrs = [corners[0].1, corners[1].1, corners[2].1];
            match self.add_face(&idx, Some(&attrs)) {
                Ok(_) => {}
                Err(HalfEdgeMeshError::NonManifoldEdge { from, to }) => {
                    log::debug!(
                        "Non-manifold edge ({}, {}): the triangle gets its own vertices.",
                        from,
                        to
                    );
                    let copy = [a, b, c].map(|pt| self.add_vertex(pt));
                    let _ = self.add_face(&copy, Some(&attrs));
                }
                Err(_) => {}
            }
        }

        self.end_face();
        let _ = self.repair_t_joints(true);
    }

    /// A representative half-edge for every face.
    pub fn faces(&self) -> Vec<EdgeId> {
        let mut visited = vec![false; self.edges.capacity()];
        let mut result = Vec::with_capacity(self.num_faces);

        for (id, edge) in self.edges.iter() {
            if edge.face.is_some() && !visited[id] {
                result.push(id);
                for e in self.face_loop(id) {
                    visited[e] = true;
                }
            }
        }

        result
    }

    /// Iterates through the loop of half-edges `edge` belongs to, starting with `edge`.
    pub fn face_loop(&self, edge: EdgeId) -> FaceLoop<'_> {
        FaceLoop {
            mesh: self,
            start: edge,
            curr: Some(edge),
        }
    }

    /// The vertex indices of the loop `edge` belongs to.
    pub fn face_vertices(&self, edge: EdgeId) -> SmallVec<[u32; 8]> {
        self.face_loop(edge)
            .map(|e| self.edges[e].vertex)
            .collect()
    }

    /// The Newell normal of the loop `edge` belongs to, scaled by twice its area.
    pub fn face_normal(&self, edge: EdgeId) -> Vector<Real> {
        newell_normal(
            self.face_loop(edge)
                .map(|e| &self.vertices[self.edges[e].vertex as usize]),
        )
    }

    /// Changes the color of every half-edge of the loop `edge` belongs to.
    pub fn recolor_face(&mut self, edge: EdgeId, color: u32) {
        let mut e = edge;
        loop {
            self.edges[e].face = Some(color);
            e = self.edges[e].next;
            if e == edge {
                break;
            }
        }
    }

    /// The bounding box of the vertices.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// The faces of this mesh as a polygon soup sharing its vertex buffer.
    ///
    /// Also returns the representative half-edge of every face of the soup.
    pub fn to_polygon_soup(&self) -> (PolygonSoup, Vec<EdgeId>) {
        let faces = self.faces();
        let mut indices = Vec::new();
        let mut sizes = Vec::with_capacity(faces.len());
        let mut materials = Vec::with_capacity(faces.len());

        for face in &faces {
            let len = indices.len();
            indices.extend(self.face_loop(*face).map(|e| self.edges[e].vertex));
            sizes.push((indices.len() - len) as u32);
            materials.push(
                self.attributes
                    .get(self.edges[*face].attribute as usize)
                    .map(|a| a.material)
                    .unwrap_or(0),
            );
        }

        let soup = PolygonSoup::new(self.vertices.clone(), indices, &sizes, &materials);
        (soup, faces)
    }

    /// Checks the connectivity invariants of this mesh.
    ///
    /// Returns `false`, and logs the first violation, if a link is dangling, if twins or
    /// `next`/`prev` links are not reciprocal, if a loop mixes face colors, or if the
    /// directed-edge map is stale.
    pub fn sanity_check(&self) -> bool {
        let mut num_face_edges = 0;

        for (id, e) in self.edges.iter() {
            let linked = [e.twin, e.next, e.prev]
                .iter()
                .all(|link| self.edges.contains(*link));
            if !linked || e.vertex as usize >= self.vertices.len() {
                log::debug!("Half-edge {} has a dangling link.", id);
                return false;
            }

            let twin = &self.edges[e.twin];
            let next = &self.edges[e.next];

            if twin.twin != id || next.prev != id || self.edges[e.prev].next != id {
                log::debug!("Half-edge {} has non-reciprocal links.", id);
                return false;
            }

            if next.face != e.face || twin.vertex != next.vertex || e.vertex == next.vertex {
                log::debug!("Half-edge {} is inconsistent with its loop.", id);
                return false;
            }

            if e.face.is_some() {
                num_face_edges += 1;
                if self.edge_map.get(&(e.vertex, next.vertex)) != Some(&id) {
                    log::debug!("Half-edge {} is missing from the edge map.", id);
                    return false;
                }
            }
        }

        num_face_edges == self.edge_map.len()
    }
}
