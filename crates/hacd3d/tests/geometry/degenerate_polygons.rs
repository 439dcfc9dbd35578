use hacd3d::math::{Point, Transform};
use hacd3d::transformation::half_edge::HalfEdgeMesh;
use hacd3d::transformation::polygon_soup::PolygonSoupBuilder;

#[test]
fn polygon_with_two_distinct_positions_is_rejected() {
    let a = Point::new(0.0, 0.0, 0.0);
    let b = Point::new(1.0, 0.0, 0.0);
    let c = Point::new(0.0, 1.0, 0.0);

    let mut mesh = HalfEdgeMesh::new();
    mesh.begin_polygon();
    assert_eq!(mesh.add_polygon(&[a, b, c], 0), 1);
    assert_eq!(mesh.add_polygon(&[a, b, a], 0), 0);
    assert_eq!(mesh.add_polygon(&[a, b, b, a], 0), 0);
    mesh.end_polygon(1.0e-6);

    assert_eq!(mesh.total_face_count(), 1);
    assert!(mesh.sanity_check());
}

#[test]
fn soup_builder_drops_degenerate_faces() {
    let vertices = [
        Point::new(0.0, 0.0, 0.0),
        Point::new(1.0, 0.0, 0.0),
        Point::new(0.0, 1.0, 0.0),
        Point::new(2.0, 0.0, 0.0),
        Point::new(1.0, 1.0, 0.0),
    ];
    // A valid triangle, a repeated index, three collinear points, and a quad with a
    // repeated vertex.
    let indices = [0, 1, 2, 0, 0, 1, 0, 1, 3, 1, 3, 4, 4];

    let mut builder = PolygonSoupBuilder::new();
    builder.begin();
    let accepted = builder.add_mesh(
        &vertices,
        &indices,
        &[3, 3, 3, 4],
        &[7, 7, 7, 7],
        &Transform::identity(),
    );
    assert_eq!(accepted, 2);

    let soup = builder.end(false);
    assert_eq!(soup.face_count(), 2);
    assert!((0..2).all(|i| soup.face(i).len() == 3 && soup.face_material(i) == 7));
}
