use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use core::ops::Range;

/// The convex pieces computed by a decomposition, stored as a single triangle mesh.
///
/// Every triangle is tagged with the layer of its piece. Layers are numbered from 0 and
/// each piece uses its own contiguous range of vertices.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ConvexDecomposition {
    vertices: Vec<Point<Real>>,
    indices: Vec<[u32; 3]>,
    layers: Vec<u32>,
    pieces: Vec<(Range<u32>, Range<u32>)>,
}

impl ConvexDecomposition {
    /// An empty decomposition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a convex piece given as a triangle mesh, returning its layer.
    pub fn push_hull(
        &mut self,
        vertices: &[Point<Real>],
        triangles: impl IntoIterator<Item = [u32; 3]>,
    ) -> u32 {
        let layer = self.pieces.len() as u32;
        let base = self.vertices.len() as u32;
        let first_triangle = self.indices.len() as u32;

        self.vertices.extend_from_slice(vertices);
        for tri in triangles {
            self.indices.push(tri.map(|i| i + base));
            self.layers.push(layer);
        }

        self.pieces.push((
            base..self.vertices.len() as u32,
            first_triangle..self.indices.len() as u32,
        ));
        layer
    }

    /// The vertices of all the pieces.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The triangles of all the pieces.
    #[inline]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// The layer of each triangle.
    #[inline]
    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// The number of convex pieces.
    #[inline]
    pub fn num_hulls(&self) -> usize {
        self.pieces.len()
    }

    /// Does this decomposition have no piece?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The vertices and triangles of the piece with the given layer.
    ///
    /// Triangle indices are relative to the returned vertices.
    pub fn hull(&self, layer: u32) -> Option<(Vec<Point<Real>>, Vec<[u32; 3]>)> {
        let (vertices, triangles) = self.pieces.get(layer as usize)?;
        Some(self.piece(vertices, triangles))
    }

    /// Iterates through the pieces, see [`Self::hull`].
    pub fn hulls(
        &self,
    ) -> impl ExactSizeIterator<Item = (Vec<Point<Real>>, Vec<[u32; 3]>)> + '_ {
        self.pieces
            .iter()
            .map(|(vertices, triangles)| self.piece(vertices, triangles))
    }

    fn piece(
        &self,
        vertices: &Range<u32>,
        triangles: &Range<u32>,
    ) -> (Vec<Point<Real>>, Vec<[u32; 3]>) {
        let base = vertices.start;
        (
            self.vertices[vertices.start as usize..vertices.end as usize].to_vec(),
            self.indices[triangles.start as usize..triangles.end as usize]
                .iter()
                .map(|tri| tri.map(|i| i - base))
                .collect(),
        )
    }

    /// The bounding box of the piece with the given layer.
    pub fn hull_aabb(&self, layer: u32) -> Option<Aabb> {
        let (vertices, _) = self.pieces.get(layer as usize)?;
        Some(Aabb::from_points(
            &self.vertices[vertices.start as usize..vertices.end as usize],
        ))
    }

    /// The bounding box of all the pieces.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}
