use super::weld_vertices;
use crate::math::{Point, Real, Transform};
use crate::shape::{newell_normal, PolygonSoup};
use crate::transformation::half_edge::HalfEdgeMesh;
use crate::utils;
use smallvec::SmallVec;

/// Above this number of faces, an optimized [`PolygonSoupBuilder::end`] bisects the faces and
/// processes both halves independently.
pub const SPLIT_THRESHOLD: usize = 1 << 16;

/// Vertices closer than this fraction of the soup diagonal are welded.
pub const WELD_TOLERANCE: Real = 1.0e-6;

/// Squared sine of the angle under which a corner is considered flat.
const COLLINEARITY_SQ: Real = 1.0e-12;

/// Accumulates meshes into a cleaned-up [`PolygonSoup`].
///
/// Use it with [`Self::begin`], any number of [`Self::add_mesh`], and [`Self::end`]. Faces that
/// can't be repaired are silently dropped.
#[derive(Clone, Debug, Default)]
pub struct PolygonSoupBuilder {
    vertices: Vec<Point<Real>>,
    indices: Vec<u32>,
    face_sizes: Vec<u32>,
    materials: Vec<u32>,
}

impl PolygonSoupBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears this builder.
    pub fn begin(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.face_sizes.clear();
        self.materials.clear();
    }

    /// The number of faces accepted so far.
    pub fn face_count(&self) -> usize {
        self.face_sizes.len()
    }

    /// The number of vertices accumulated so far.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Appends a mesh after transforming its vertices by `transform`.
    ///
    /// Faces are consecutive runs of `indices` whose lengths are given by `face_sizes`, and
    /// `materials` gives one tag per face (missing tags default to 0). Triangles are only
    /// checked for repeated indices and zero area. Larger polygons are cleaned up by
    /// removing coincident and collinear vertices. Returns the number of faces accepted.
    pub fn add_mesh(
        &mut self,
        vertices: &[Point<Real>],
        indices: &[u32],
        face_sizes: &[u32],
        materials: &[u32],
        transform: &Transform,
    ) -> usize {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(vertices.iter().map(|pt| transform.transform_point(pt)));

        let mut accepted = 0;
        let mut offset = 0;

        for (i, size) in face_sizes.iter().enumerate() {
            let size = *size as usize;
            let Some(face) = indices.get(offset..offset + size) else {
                break;
            };
            offset += size;

            if face.iter().any(|id| *id as usize >= vertices.len()) {
                continue;
            }

            let face: SmallVec<[u32; 8]> = face.iter().map(|id| id + base).collect();
            let material = materials.get(i).copied().unwrap_or(0);

            if self.push_face(&face, material) {
                accepted += 1;
            }
        }

        accepted
    }

    fn push_face(&mut self, face: &[u32], material: u32) -> bool {
        let filtered = if face.len() == 3 {
            if is_valid_triangle(&self.vertices, face) {
                SmallVec::from_slice(face)
            } else {
                SmallVec::new()
            }
        } else {
            filter_polygon(&self.vertices, face)
        };

        if filtered.len() < 3 {
            return false;
        }

        self.indices.extend_from_slice(&filtered);
        self.face_sizes.push(filtered.len() as u32);
        self.materials.push(material);
        true
    }

    /// Finishes the soup.
    ///
    /// Vertices are welded, unused vertices removed, and every face is filtered again. With
    /// `optimize`, inputs with more than [`SPLIT_THRESHOLD`] faces are bisected and built
    /// recursively, and faces are grouped by material and sorted spatially.
    pub fn end(&mut self, optimize: bool) -> PolygonSoup {
        let num_input_faces = self.face_count();

        if optimize && num_input_faces > SPLIT_THRESHOLD {
            let (mut left, mut right) = self.bisect();
            let left = left.end(true);
            let right = right.end(true);
            self.begin();
            self.append_soup(&left);
            self.append_soup(&right);
        }

        self.weld();

        if optimize {
            self.sort_by_material();
        }

        self.refilter();

        if num_input_faces > 0 && self.face_sizes.is_empty() {
            log::warn!("All the {} faces of the polygon soup were rejected.", num_input_faces);
        }

        let soup = PolygonSoup::new(
            core::mem::take(&mut self.vertices),
            core::mem::take(&mut self.indices),
            &self.face_sizes,
            &self.materials,
        );
        self.begin();
        soup
    }

    fn faces(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.face_sizes.iter().scan(0, move |offset, size| {
            let face = &self.indices[*offset..*offset + *size as usize];
            *offset += *size as usize;
            Some(face)
        })
    }

    fn face_centroids(&self) -> Vec<Point<Real>> {
        self.faces()
            .map(|face| {
                let pts: SmallVec<[Point<Real>; 8]> =
                    face.iter().map(|i| self.vertices[*i as usize]).collect();
                utils::center(&pts)
            })
            .collect()
    }

    /// Splits the faces in two halves along the axis of highest variance of their centroids.
    fn bisect(&self) -> (PolygonSoupBuilder, PolygonSoupBuilder) {
        let centroids = self.face_centroids();
        let (_, cov) = utils::center_cov(&centroids);
        let axis = cov.diagonal().imax();

        let mut order: Vec<usize> = (0..centroids.len()).collect();
        let mid = order.len() / 2;
        let _ = order.select_nth_unstable_by(mid, |a, b| {
            centroids[*a][axis].total_cmp(&centroids[*b][axis])
        });

        let faces: Vec<&[u32]> = self.faces().collect();
        let mut halves = (PolygonSoupBuilder::new(), PolygonSoupBuilder::new());

        for (k, face_id) in order.into_iter().enumerate() {
            let half = if k < mid { &mut halves.0 } else { &mut halves.1 };
            half.push_raw_face(&self.vertices, faces[face_id], self.materials[face_id]);
        }

        halves
    }

    fn push_raw_face(&mut self, vertices: &[Point<Real>], face: &[u32], material: u32) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(face.iter().map(|i| vertices[*i as usize]));
        self.indices
            .extend((0..face.len() as u32).map(|i| base + i));
        self.face_sizes.push(face.len() as u32);
        self.materials.push(material);
    }

    fn append_soup(&mut self, soup: &PolygonSoup) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(soup.vertices());

        for (face, material) in soup.faces() {
            self.indices.extend(face.iter().map(|i| i + base));
            self.face_sizes.push(face.len() as u32);
            self.materials.push(material);
        }
    }

    fn weld(&mut self) {
        let diagonal = if self.vertices.is_empty() {
            0.0
        } else {
            crate::bounding_volume::Aabb::from_points(&self.vertices).diagonal()
        };

        let (welded, remap) = weld_vertices(&self.vertices, WELD_TOLERANCE * diagonal);
        self.vertices = welded;

        for i in &mut self.indices {
            *i = remap[*i as usize];
        }

        // Remove the unused vertices.
        let mut used = vec![u32::MAX; self.vertices.len()];
        let mut compacted = Vec::with_capacity(self.vertices.len());
        for i in &mut self.indices {
            if used[*i as usize] == u32::MAX {
                used[*i as usize] = compacted.len() as u32;
                compacted.push(self.vertices[*i as usize]);
            }
            *i = used[*i as usize];
        }
        self.vertices = compacted;
    }

    /// Groups the faces by material, and sorts each group along the axis of highest variance
    /// of the face centroids.
    fn sort_by_material(&mut self) {
        let centroids = self.face_centroids();
        let (_, cov) = utils::center_cov(&centroids);
        let axis = cov.diagonal().imax();

        let mut order: Vec<usize> = (0..centroids.len()).collect();
        order.sort_by(|a, b| {
            self.materials[*a]
                .cmp(&self.materials[*b])
                .then(centroids[*a][axis].total_cmp(&centroids[*b][axis]))
        });

        let faces: Vec<SmallVec<[u32; 8]>> = self.faces().map(SmallVec::from_slice).collect();
        let materials = core::mem::take(&mut self.materials);
        self.indices.clear();
        self.face_sizes.clear();

        for face_id in order {
            self.indices.extend_from_slice(&faces[face_id]);
            self.face_sizes.push(faces[face_id].len() as u32);
            self.materials.push(materials[face_id]);
        }
    }

    fn refilter(&mut self) {
        let faces: Vec<SmallVec<[u32; 8]>> = self.faces().map(SmallVec::from_slice).collect();
        let materials = core::mem::take(&mut self.materials);
        self.indices.clear();
        self.face_sizes.clear();

        for (face, material) in faces.iter().zip(materials) {
            let _ = self.push_face(face, material);
        }
    }
}

fn is_valid_triangle(vertices: &[Point<Real>], face: &[u32]) -> bool {
    if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
        return false;
    }

    let [a, b, c] = [0, 1, 2].map(|k| vertices[face[k] as usize]);
    let (ab, ac) = (b - a, c - a);
    let n = ab.cross(&ac);
    n.norm_squared() > COLLINEARITY_SQ * ab.norm_squared() * ac.norm_squared()
}

/// Squared sine of the angle of the corner `a, b, c`, or 0 if an edge is degenerate.
fn corner_sin_sq(a: &Point<Real>, b: &Point<Real>, c: &Point<Real>) -> Real {
    let (ab, bc) = (b - a, c - b);
    let denom = ab.norm_squared() * bc.norm_squared();

    if denom == 0.0 {
        0.0
    } else {
        ab.cross(&bc).norm_squared() / denom
    }
}

/// Cleans up a polygon, returning its new index loop or an empty loop if it is degenerate.
///
/// Consecutive coincident vertices and vertices on flat corners are removed. The remaining
/// loop is checked through a temporary half-edge mesh, which rejects repeated vertices, and
/// is rotated to start at its sharpest corner.
pub(crate) fn filter_polygon(vertices: &[Point<Real>], face: &[u32]) -> SmallVec<[u32; 8]> {
    let mut ring: SmallVec<[u32; 8]> = SmallVec::from_slice(face);
    let scale_sq = utils::center_cov(&ring.iter().map(|i| vertices[*i as usize]).collect::<Vec<_>>())
        .1
        .trace();
    let coincident_sq = scale_sq * COLLINEARITY_SQ;

    loop {
        let n = ring.len();
        if n < 3 {
            return SmallVec::new();
        }

        let flat = (0..n).find(|i| {
            let a = &vertices[ring[(i + n - 1) % n] as usize];
            let b = &vertices[ring[*i] as usize];
            let c = &vertices[ring[(i + 1) % n] as usize];
            na::distance_squared(a, b) <= coincident_sq || corner_sin_sq(a, b, c) <= COLLINEARITY_SQ
        });

        match flat {
            Some(i) => {
                let _ = ring.remove(i);
            }
            None => break,
        }
    }

    let points: Vec<Point<Real>> = ring.iter().map(|i| vertices[*i as usize]).collect();
    let area_sq = newell_normal(&points).norm_squared() / 4.0;
    if area_sq <= COLLINEARITY_SQ * scale_sq * scale_sq {
        return SmallVec::new();
    }

    // Local indices, with repeated vertices mapped to the same index.
    let local: SmallVec<[u32; 8]> = ring
        .iter()
        .map(|i| ring.iter().position(|j| j == i).unwrap_or(0) as u32)
        .collect();
    let mut mesh = HalfEdgeMesh::with_vertices(points);
    mesh.begin_face();
    let Ok(first) = mesh.add_face(&local, None) else {
        return SmallVec::new();
    };
    mesh.end_face();

    let n = ring.len();
    let sharpest = mesh
        .face_loop(first)
        .enumerate()
        .map(|(k, _)| {
            let v = |i: usize| mesh.vertices()[local[i % n] as usize];
            (k, corner_sin_sq(&v(k + n - 1), &v(k), &v(k + 1)))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
        .unwrap_or(0);

    ring.rotate_left(sharpest);
    ring
}

#[cfg(test)]
mod test {
    use super::{filter_polygon, PolygonSoupBuilder, SPLIT_THRESHOLD};
    use crate::math::{Point, Transform};

    #[test]
    fn filter_removes_coincident_and_collinear_vertices() {
        let vertices = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.0, 2.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        ];
        let filtered = filter_polygon(&vertices, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(filtered.len(), 4);
        assert!(!filtered.contains(&1));
    }

    #[test]
    fn filter_rejects_flat_and_repeated_loops() {
        let vertices = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(3.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        ];
        assert!(filter_polygon(&vertices, &[0, 1, 2, 3]).is_empty());
        assert!(filter_polygon(&vertices, &[0, 1, 4, 1]).is_empty());
    }

    #[test]
    fn build_transformed_quads_and_triangles() {
        let vertices = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let transform = Transform::new_translation(&na::Vector3::new(10.0, 0.0, 0.0));

        let mut builder = PolygonSoupBuilder::new();
        builder.begin();
        assert_eq!(
            builder.add_mesh(&vertices, &[0, 1, 2, 3, 0, 0, 1], &[4, 3], &[5, 6], &transform),
            1
        );
        // The same quad again, split in two triangles sharing welded vertices.
        assert_eq!(
            builder.add_mesh(&vertices, &[0, 1, 2, 0, 2, 3], &[3, 3], &[], &transform),
            2
        );

        let soup = builder.end(true);
        assert_eq!(soup.face_count(), 3);
        assert_eq!(soup.vertices().len(), 4);
        assert_eq!(soup.aabb().mins, Point::new(10.0, 0.0, 0.0));
        // Faces are grouped by material.
        assert_eq!(soup.face_material(0), 0);
        assert_eq!(soup.face_material(1), 0);
        assert_eq!(soup.face_material(2), 5);
    }

    #[test]
    fn unused_vertex_removal_keeps_positions() {
        let vertices = [
            Point::new(5.0, 5.0, 5.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];

        let mut builder = PolygonSoupBuilder::new();
        builder.begin();
        assert_eq!(
            builder.add_mesh(&vertices, &[2, 3, 1], &[3], &[], &Transform::identity()),
            1
        );

        let soup = builder.end(false);
        assert_eq!(soup.face_count(), 1);
        assert_eq!(soup.vertices().len(), 3);

        let face: Vec<_> = soup.face_vertices(0).into_iter().collect();
        assert!(face.contains(&Point::new(0.0, 0.0, 0.0)));
        assert!(face.contains(&Point::new(1.0, 0.0, 0.0)));
        assert!(face.contains(&Point::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn bisected_build_matches_the_direct_one() {
        let n = 260;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for i in 0..n {
            for j in 0..n {
                vertices.push(Point::new(i as f64, j as f64, ((i * j) % 7) as f64 * 0.1));
            }
        }

        for i in 0..n - 1 {
            for j in 0..n - 1 {
                let id = (i * n + j) as u32;
                indices.extend_from_slice(&[id, id + n as u32, id + 1]);
                indices.extend_from_slice(&[id + 1, id + n as u32, id + n as u32 + 1]);
            }
        }

        let sizes = vec![3; indices.len() / 3];
        assert!(sizes.len() > SPLIT_THRESHOLD);

        let mut builder = PolygonSoupBuilder::new();
        builder.begin();
        let _ = builder.add_mesh(&vertices, &indices, &sizes, &[], &Transform::identity());
        let split = builder.end(true);

        builder.begin();
        let _ = builder.add_mesh(&vertices, &indices, &sizes, &[], &Transform::identity());
        let direct = builder.end(false);

        assert_eq!(split.face_count(), direct.face_count());
        assert_eq!(split.vertices().len(), direct.vertices().len());
        assert_eq!(split.aabb(), direct.aabb());
    }
}
