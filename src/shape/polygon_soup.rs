//! A flat list of planar polygons sharing a vertex buffer.

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::shape::Triangle;
use smallvec::SmallVec;

/// A set of planar polygons indexing a shared vertex buffer.
///
/// Faces are stored as consecutive runs of `indices`: face `i` uses the indices in
/// `face_offsets[i]..face_offsets[i + 1]`. Every face carries a material tag and a cached
/// unit normal computed with Newell's method.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PolygonSoup {
    vertices: Vec<Point<Real>>,
    indices: Vec<u32>,
    face_offsets: Vec<u32>,
    materials: Vec<u32>,
    normals: Vec<Vector<Real>>,
    aabb: Aabb,
}

/// Newell's normal of a polygon, scaled by twice its area.
///
/// This is robust to slightly non-planar and to non-convex polygons.
pub fn newell_normal<'a>(pts: impl IntoIterator<Item = &'a Point<Real>>) -> Vector<Real> {
    let pts: SmallVec<[Point<Real>; 8]> = pts.into_iter().copied().collect();
    let mut normal = Vector::zeros();

    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }

    normal
}

impl PolygonSoup {
    /// Creates a polygon soup from a vertex buffer and faces given as consecutive runs of
    /// `indices` whose lengths are listed by `face_sizes`.
    ///
    /// `materials` gives one tag per face. Missing tags default to 0.
    pub fn new(
        vertices: Vec<Point<Real>>,
        indices: Vec<u32>,
        face_sizes: &[u32],
        materials: &[u32],
    ) -> Self {
        let mut face_offsets = Vec::with_capacity(face_sizes.len() + 1);
        face_offsets.push(0);

        for size in face_sizes {
            let last = face_offsets[face_offsets.len() - 1];
            face_offsets.push(last + *size);
        }

        debug_assert_eq!(face_offsets[face_offsets.len() - 1] as usize, indices.len());

        let materials = (0..face_sizes.len())
            .map(|i| materials.get(i).copied().unwrap_or(0))
            .collect();

        let mut result = PolygonSoup {
            vertices,
            indices,
            face_offsets,
            materials,
            normals: Vec::new(),
            aabb: Aabb::new_invalid(),
        };

        result.normals = (0..result.face_count())
            .map(|i| {
                newell_normal(result.face(i).iter().map(|id| &result.vertices[*id as usize]))
                    .try_normalize(0.0)
                    .unwrap_or_else(Vector::zeros)
            })
            .collect();
        result.aabb = Aabb::from_points(&result.vertices);
        result
    }

    /// The vertex buffer.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The concatenated face index buffer.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The number of faces of this soup.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    /// Is this soup free of any face?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }

    /// The vertex indices of the `i`-th face.
    #[inline]
    pub fn face(&self, i: usize) -> &[u32] {
        &self.indices[self.face_offsets[i] as usize..self.face_offsets[i + 1] as usize]
    }

    /// The vertex positions of the `i`-th face.
    pub fn face_vertices(&self, i: usize) -> SmallVec<[Point<Real>; 8]> {
        self.face(i)
            .iter()
            .map(|id| self.vertices[*id as usize])
            .collect()
    }

    /// The material tag of the `i`-th face.
    #[inline]
    pub fn face_material(&self, i: usize) -> u32 {
        self.materials[i]
    }

    /// The unit normal of the `i`-th face, or zero if it is degenerate.
    #[inline]
    pub fn face_normal(&self, i: usize) -> Vector<Real> {
        self.normals[i]
    }

    /// The bounding box of the `i`-th face.
    pub fn face_aabb(&self, i: usize) -> Aabb {
        Aabb::from_points(self.face(i).iter().map(|id| &self.vertices[*id as usize]))
    }

    /// The fan triangles of the `i`-th face.
    pub fn face_triangles(&self, i: usize) -> impl Iterator<Item = Triangle> + '_ {
        let face = self.face(i);
        let a = self.vertices[face[0] as usize];
        face.windows(2).skip(1).map(move |w| {
            Triangle::new(a, self.vertices[w[0] as usize], self.vertices[w[1] as usize])
        })
    }

    /// The bounding box of every vertex of this soup.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The length of the diagonal of the bounding box of this soup.
    #[inline]
    pub fn diagonal(&self) -> Real {
        if self.vertices.is_empty() {
            0.0
        } else {
            self.aabb.diagonal()
        }
    }

    /// Iterates over every face as `(vertex indices, material)`.
    pub fn faces(&self) -> impl ExactSizeIterator<Item = (&[u32], u32)> + '_ {
        (0..self.face_count()).map(move |i| (self.face(i), self.materials[i]))
    }
}
