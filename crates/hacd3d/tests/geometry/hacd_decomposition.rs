use crate::meshes::{cube, sphere, thin_slab, two_cubes_with_bridge};
use hacd3d::math::{Point, Real};
use hacd3d::transformation::hacd::{
    convex_decomposition, AdjacencyKind, ConvexDecomposition, Hacd, HacdParameters, HacdState,
    MergeStrategy, NoProgress, SerialRunner,
};
use hacd3d::transformation::half_edge::HalfEdgeMesh;
use hacd3d::transformation::ConvexHull;

fn decompose(mesh: &HalfEdgeMesh, max_concavity: Real, max_clusters: usize) -> ConvexDecomposition {
    let params = HacdParameters {
        max_concavity,
        max_clusters,
        ..HacdParameters::default()
    };
    convex_decomposition(mesh, &params, &mut NoProgress, &SerialRunner).unwrap()
}

fn assert_vertices_covered(mesh: &HalfEdgeMesh, decomposition: &ConvexDecomposition) {
    let hulls: Vec<_> = decomposition
        .hulls()
        .map(|(vertices, _)| ConvexHull::new(&vertices, 0.0, usize::MAX))
        .collect();

    for pt in mesh.vertices() {
        assert!(
            hulls.iter().any(|hull| hull.contains_point(pt, 1.0e-6)),
            "Vertex {:?} is outside of every convex piece.",
            pt
        );
    }
}

#[test]
fn cube_gives_a_single_piece() {
    let mesh = cube();
    let decomposition = decompose(&mesh, 1.0, 1);

    assert_eq!(decomposition.num_hulls(), 1);
    let aabb = decomposition.aabb();
    assert_relative_eq!(aabb.mins, Point::new(-0.5, -0.5, -0.5), epsilon = 1.0e-3);
    assert_relative_eq!(aabb.maxs, Point::new(0.5, 0.5, 0.5), epsilon = 1.0e-3);
    assert!(decomposition.layers().iter().all(|l| *l == 0));
    assert_vertices_covered(&mesh, &decomposition);
}

#[test]
fn greedy_merging_of_a_cube() {
    let mesh = cube();
    let params = HacdParameters {
        strategy: MergeStrategy::Greedy,
        max_clusters: 1,
        ..HacdParameters::default()
    };
    let decomposition = Hacd::decompose(&mesh, &params).unwrap();
    assert_eq!(decomposition.num_hulls(), 1);
}

#[test]
fn bridged_cubes_split_at_low_concavity() {
    let mesh = two_cubes_with_bridge();

    let fine = decompose(&mesh, 0.02, 16);
    assert!(fine.num_hulls() >= 2, "Got {} pieces.", fine.num_hulls());
    assert!(fine.num_hulls() <= 16);

    let coarse = decompose(&mesh, 1.0, 16);
    assert_eq!(coarse.num_hulls(), 1);
    assert_vertices_covered(&mesh, &coarse);
}

#[test]
fn convex_mesh_is_never_split() {
    let mesh = sphere();
    let input_aabb = mesh.aabb();

    for max_concavity in [0.0, 0.01, 0.2, 1.0] {
        let decomposition = decompose(&mesh, max_concavity, 16);

        assert_eq!(decomposition.num_hulls(), 1);
        let aabb = decomposition.aabb();
        assert_relative_eq!(aabb.mins, input_aabb.mins, epsilon = 1.0e-6);
        assert_relative_eq!(aabb.maxs, input_aabb.maxs, epsilon = 1.0e-6);
        assert_vertices_covered(&mesh, &decomposition);
    }
}

#[test]
fn trimesh_front_end() {
    let vertices = [
        Point::new(0.0, 0.0, 0.0),
        Point::new(1.0, 0.0, 0.0),
        Point::new(0.0, 1.0, 0.0),
        Point::new(0.0, 0.0, 1.0),
    ];
    let indices = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
    let decomposition =
        Hacd::decompose_trimesh(&vertices, &indices, &HacdParameters::default()).unwrap();

    assert_eq!(decomposition.num_hulls(), 1);
    let (hull_vertices, triangles) = decomposition.hull(0).unwrap();
    assert_eq!(hull_vertices.len(), 4);
    assert_eq!(triangles.len(), 4);

    // The same triangle twice makes a non-manifold edge.
    let duplicated = [[0, 2, 1], [0, 2, 1]];
    assert!(Hacd::decompose_trimesh(&vertices, &duplicated, &HacdParameters::default()).is_err());
}

#[test]
fn thin_slab_faces_are_linked_through_the_inside() {
    let mesh = thin_slab();
    let hacd = Hacd::new(&mesh, &HacdParameters::default(), &mut NoProgress).unwrap();
    assert_eq!(hacd.state(), HacdState::Initialized);

    let graph = hacd.graph();
    let mut num_proximity = 0;

    for (a, node) in graph.nodes() {
        for edge in node.edges.iter().filter(|e| e.kind == AdjacencyKind::Proximity) {
            let other = graph.node(edge.neighbor).unwrap();
            let na = node.cluster.faces[0].normal;
            let nb = other.cluster.faces[0].normal;

            // Only the two large faces are close enough to see each other.
            assert!(na.z.abs() > 0.9 && nb.z.abs() > 0.9 && na.z * nb.z < 0.0);
            assert_eq!(edge.kind.back_face_handicap(), 0.5);
            assert_ne!(a, edge.neighbor);
            num_proximity += 1;
        }
    }

    assert!(num_proximity > 0);

    let decomposition = decompose(&mesh, 0.2, 16);
    assert_eq!(decomposition.num_hulls(), 1);
    assert_vertices_covered(&mesh, &decomposition);
}
