//! Polygonal meshes with half-edge connectivity and their topological edits.

pub use self::error::HalfEdgeMeshError;
pub use self::half_edge_mesh::{EdgeId, FaceLoop, HalfEdge, HalfEdgeMesh, VertexAttribute};

mod convex_partition;
mod edit;
mod error;
mod half_edge_mesh;
mod t_joints;
mod triangulate;

#[cfg(test)]
mod test {
    use super::{HalfEdgeMesh, HalfEdgeMeshError};
    use crate::math::Point;

    fn square_points() -> Vec<Point<f64>> {
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn build_two_triangles() {
        let mut mesh = HalfEdgeMesh::with_vertices(square_points());
        assert_eq!(
            mesh.add_face(&[0, 1, 2], None),
            Err(HalfEdgeMeshError::NotBuilding)
        );

        mesh.begin_face();
        let _ = mesh.add_face(&[0, 1, 2], None).unwrap();
        let _ = mesh.add_face(&[0, 2, 3], None).unwrap();
        assert_eq!(
            mesh.add_face(&[0, 1, 3], None),
            Err(HalfEdgeMeshError::NonManifoldEdge { from: 0, to: 1 })
        );
        assert_eq!(
            mesh.add_face(&[1, 1, 3], None),
            Err(HalfEdgeMeshError::DegenerateFace)
        );
        assert_eq!(
            mesh.add_face(&[1, 2, 7], None),
            Err(HalfEdgeMeshError::InvalidVertex(7))
        );
        mesh.end_face();

        assert_eq!(mesh.total_face_count(), 2);
        assert_eq!(mesh.faces().len(), 2);
        // 6 face half-edges and 4 boundary half-edges.
        assert_eq!(mesh.num_edges(), 10);
        assert!(mesh.sanity_check());

        let diagonal = mesh.find_edge(0, 2).unwrap();
        assert_eq!(mesh.edge(mesh.edge(diagonal).twin).vertex, 2);

        let boundary = mesh.edge(mesh.find_edge(0, 1).unwrap()).twin;
        assert_eq!(mesh.edge(boundary).face, None);
        assert_eq!(mesh.face_loop(boundary).count(), 4);
    }

    #[test]
    fn faces_added_later_are_glued() {
        let mut mesh = HalfEdgeMesh::with_vertices(square_points());
        mesh.begin_face();
        let _ = mesh.add_face(&[0, 1, 2], None).unwrap();
        mesh.end_face();

        mesh.begin_face();
        let _ = mesh.add_face(&[0, 2, 3], None).unwrap();
        mesh.end_face();

        assert_eq!(mesh.num_edges(), 10);
        assert!(mesh.sanity_check());
    }

    #[test]
    fn polygon_front_end_welds_and_rejects_degenerate_faces() {
        let mut mesh = HalfEdgeMesh::new();
        mesh.begin_polygon();

        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.0, 1.0, 0.0);
        let d = Point::new(1.0, 1.0, 0.0);

        assert_eq!(mesh.add_polygon(&[a, b, c], 0), 1);
        assert_eq!(mesh.add_polygon(&[b, d, c], 0), 1);
        // Three indices over two distinct positions.
        assert_eq!(mesh.add_polygon(&[a, b, b], 0), 0);
        assert_eq!(mesh.add_polygon(&[a, b, d, c], 1), 2);

        mesh.end_polygon(1.0e-6);

        // Both triangles of the last quad overlap existing ones and get their own vertices.
        assert_eq!(mesh.total_face_count(), 4);
        assert_eq!(mesh.vertices().len(), 10);
        assert!(mesh.sanity_check());
    }

    #[test]
    fn degenerate_polygon_leaves_the_face_count_unchanged() {
        let mut mesh = HalfEdgeMesh::new();
        mesh.begin_polygon();
        let _ = mesh.add_polygon(
            &[
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
            ],
            0,
        );
        let _ = mesh.add_polygon(
            &[
                Point::new(0.0, 0.0, 0.0),
                Point::new(2.0, 2.0, 2.0),
                Point::new(0.0, 0.0, 0.0),
            ],
            0,
        );
        mesh.end_polygon(0.0);

        assert_eq!(mesh.total_face_count(), 1);
    }
}
