use super::{EdgeId, HalfEdgeMesh};
use crate::math::{Point, Real, Vector};
use crate::utils::hashmap::HashMap;
use smallvec::SmallVec;

/// Maximum distance of a vertex of a crack to the line through its extreme vertices.
const T_JOINT_TOLERANCE: Real = 1.0e-4;

impl HalfEdgeMesh {
    /// Stitches the cracks left by T-joints.
    ///
    /// A boundary loop whose vertices all lie within `1.0e-4` of the line through its extreme
    /// vertices is a crack: the faces on one side have vertices hanging on the edges of the
    /// faces on the other side. The edges of both sides are split at the hanging vertices and
    /// the resulting half-edges are twinned, removing the boundary loop. If `triangulate` is
    /// `true`, the faces that received new vertices are triangulated afterwards.
    ///
    /// Returns the number of cracks stitched.
    pub fn repair_t_joints(&mut self, triangulate: bool) -> usize {
        self.relink_pinched_boundaries();

        let mut visited = vec![false; self.edges.capacity()];
        let mut loops = Vec::new();

        for (id, edge) in self.edges.iter() {
            if edge.face.is_none() && !visited[id] {
                let boundary: Vec<_> = self.face_loop(id).collect();
                for e in &boundary {
                    visited[*e] = true;
                }
                loops.push(boundary);
            }
        }

        let mut repaired = 0;
        let mut touched = Vec::new();

        for boundary in loops {
            if let Some(faces) = self.stitch_crack(&boundary) {
                repaired += 1;
                touched.extend(faces);
            }
        }

        if repaired > 0 {
            log::debug!("Repaired {} T-joint cracks.", repaired);
        }

        if triangulate {
            for edge in touched {
                if self.edges.get(edge).is_some_and(|e| e.face.is_some()) {
                    let _ = self.triangulate_face(edge);
                }
            }
        }

        repaired
    }

    /// Relinks the boundary loops at vertices shared by several boundary fans.
    ///
    /// Each incoming boundary half-edge is followed by the outgoing one making the sharpest
    /// turn with it, so that the two sides of a crack end up in the same loop.
    fn relink_pinched_boundaries(&mut self) {
        let mut outgoing: HashMap<u32, SmallVec<[EdgeId; 2]>> = HashMap::default();

        for (id, edge) in self.edges.iter() {
            if edge.face.is_none() {
                outgoing.entry(edge.vertex).or_default().push(id);
            }
        }

        for (vertex, outs) in outgoing {
            if outs.len() < 2 {
                continue;
            }

            let center = self.vertices[vertex as usize];
            let direction = |mesh: &Self, v: u32| {
                (mesh.vertices[v as usize] - center)
                    .try_normalize(0.0)
                    .unwrap_or_else(Vector::zeros)
            };
            let ins: SmallVec<[EdgeId; 2]> = outs.iter().map(|o| self.edges[*o].prev).collect();
            let mut candidates = Vec::with_capacity(ins.len() * outs.len());

            for i in &ins {
                let back = direction(self, self.edges[*i].vertex);
                for o in &outs {
                    let forward = direction(self, self.dest(*o));
                    candidates.push((back.dot(&forward), *i, *o));
                }
            }

            candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
            let mut linked_in = SmallVec::<[EdgeId; 2]>::new();
            let mut linked_out = SmallVec::<[EdgeId; 2]>::new();

            for (_, i, o) in candidates {
                if !linked_in.contains(&i) && !linked_out.contains(&o) {
                    self.edges[i].next = o;
                    self.edges[o].prev = i;
                    linked_in.push(i);
                    linked_out.push(o);
                }
            }
        }
    }

    /// Parameters of the vertices of a boundary loop along the line through its extreme
    /// vertices, or `None` if the loop is not a crack.
    fn crack_parameters(&self, boundary: &[EdgeId]) -> Option<HashMap<u32, Real>> {
        if boundary.len() < 3 {
            return None;
        }

        let vertices: Vec<u32> = boundary.iter().map(|e| self.edges[*e].vertex).collect();
        let points: Vec<Point<Real>> = vertices
            .iter()
            .map(|v| self.vertices[*v as usize])
            .collect();

        let (longest, _) = (0..points.len())
            .map(|i| (i, (points[(i + 1) % points.len()] - points[i]).norm_squared()))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        let dir = (points[(longest + 1) % points.len()] - points[longest]).try_normalize(0.0)?;

        let projections: Vec<Real> = points
            .iter()
            .map(|pt| (pt - points[0]).dot(&dir))
            .collect();
        let (imin, _) = projections
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))?;
        let (imax, _) = projections
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;

        let origin = points[imin];
        let axis = (points[imax] - origin).try_normalize(0.0)?;
        let mut params = HashMap::default();

        for (v, pt) in vertices.iter().zip(points.iter()) {
            let t = (pt - origin).dot(&axis);
            let dist = (pt - (origin + axis * t)).norm();

            if dist > T_JOINT_TOLERANCE || params.insert(*v, t).is_some() {
                return None;
            }
        }

        // Both chains between the extreme vertices must be monotonic.
        let n = vertices.len();
        let mut changes = 0;
        for i in 0..n {
            let t0 = params[&vertices[i]];
            let t1 = params[&vertices[(i + 1) % n]];
            let t2 = params[&vertices[(i + 2) % n]];
            if (t1 - t0) * (t2 - t1) <= 0.0 {
                changes += 1;
            }
        }

        (changes == 2).then_some(params)
    }

    /// Stitches a crack, returning the face half-edges that were split.
    fn stitch_crack(&mut self, boundary: &[EdgeId]) -> Option<Vec<EdgeId>> {
        let params = self.crack_parameters(boundary)?;
        let mut sorted: Vec<(Real, u32)> = params.iter().map(|(v, t)| (*t, *v)).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        if sorted.windows(2).any(|w| w[1].0 - w[0].0 <= Real::EPSILON) {
            return None;
        }

        let mut touched = Vec::new();

        for b in boundary {
            let mut face_edge = self.edges[*b].twin;
            let from = self.edges[face_edge].vertex;
            let to = self.edges[*b].vertex;
            let (t_from, t_to) = (params[&from], params[&to]);

            let mut hanging: Vec<(Real, u32)> = sorted
                .iter()
                .copied()
                .filter(|(t, _)| *t > t_from.min(t_to) && *t < t_from.max(t_to))
                .collect();

            if t_from > t_to {
                hanging.reverse();
            }

            touched.push(face_edge);

            let mut t_start = t_from;
            for (t, vertex) in hanging {
                let local_t = (t - t_start) / (t_to - t_start);
                face_edge = match self.split_edge_at(face_edge, vertex, local_t) {
                    Ok(e) => self.edges[e].next,
                    Err(err) => {
                        log::debug!("Could not split a T-joint edge: {}", err);
                        return None;
                    }
                };
                t_start = t;
            }
        }

        // The crack boundary loop now pairs up exactly.
        let start = boundary[0];
        let crack: Vec<_> = self.face_loop(start).collect();
        let mut by_key: HashMap<(u32, u32), EdgeId> = HashMap::default();

        for b in &crack {
            let _ = by_key.insert((self.edges[*b].vertex, self.dest(*b)), *b);
        }

        let mut pairs = Vec::with_capacity(crack.len() / 2);
        for b in &crack {
            let key = (self.edges[*b].vertex, self.dest(*b));
            let opposite = by_key.get(&(key.1, key.0))?;
            if b < opposite {
                pairs.push((*b, *opposite));
            }
        }

        if pairs.len() * 2 != crack.len() {
            return None;
        }

        for (b1, b2) in pairs {
            let f1 = self.edges[b1].twin;
            let f2 = self.edges[b2].twin;
            self.edges[f1].twin = f2;
            self.edges[f2].twin = f1;
            let _ = self.edges.remove(b1);
            let _ = self.edges.remove(b2);
        }

        Some(touched)
    }
}
