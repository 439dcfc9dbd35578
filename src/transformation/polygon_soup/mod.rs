//! Construction of cleaned-up polygon soups from raw vertex and index buffers.

pub use self::builder::{PolygonSoupBuilder, SPLIT_THRESHOLD, WELD_TOLERANCE};
pub use self::weld::weld_vertices;

mod builder;
mod weld;

use crate::math::Real;
use crate::shape::PolygonSoup;
use crate::transformation::half_edge::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Builds a half-edge mesh from the faces of a polygon soup.
    ///
    /// Positions are welded within `tolerance`. Faces that would make an edge non-manifold
    /// get their own copy of their vertices, and T-joints are repaired.
    pub fn from_polygon_soup(soup: &PolygonSoup, tolerance: Real) -> Self {
        let mut mesh = HalfEdgeMesh::new();
        mesh.begin_polygon();

        for i in 0..soup.face_count() {
            let _ = mesh.add_polygon(&soup.face_vertices(i), soup.face_material(i));
        }

        mesh.end_polygon(tolerance);
        mesh
    }
}

#[cfg(test)]
mod test {
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Transform};
    use crate::transformation::half_edge::HalfEdgeMesh;
    use crate::transformation::polygon_soup::PolygonSoupBuilder;

    #[test]
    fn soup_to_half_edge_mesh_and_back() {
        let aabb = Aabb::new(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let indices = [
            0, 3, 2, 1, 4, 5, 6, 7, 0, 1, 5, 4, 2, 3, 7, 6, 1, 2, 6, 5, 0, 4, 7, 3,
        ];
        let materials = [0, 0, 1, 1, 2, 2];

        let mut builder = PolygonSoupBuilder::new();
        builder.begin();
        let _ = builder.add_mesh(
            &aabb.vertices(),
            &indices,
            &[4; 6],
            &materials,
            &Transform::identity(),
        );
        let soup = builder.end(false);

        let mesh = HalfEdgeMesh::from_polygon_soup(&soup, 1.0e-6);
        assert!(mesh.sanity_check());
        // Every quad is split in two triangles.
        assert_eq!(mesh.total_face_count(), 12);
        assert_eq!(mesh.vertices().len(), 8);

        let (back, faces) = mesh.to_polygon_soup();
        assert_eq!(back.face_count(), 12);
        assert_eq!(faces.len(), 12);
        assert_eq!(back.aabb(), &aabb);

        let mut face_materials: Vec<_> = (0..12).map(|i| back.face_material(i)).collect();
        face_materials.sort_unstable();
        assert_eq!(face_materials, [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }
}
