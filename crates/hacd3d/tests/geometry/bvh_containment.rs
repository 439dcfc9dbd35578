use hacd3d::bounding_volume::Aabb;
use hacd3d::math::{Point, Real};
use hacd3d::partitioning::AabbPolygonSoup;
use hacd3d::shape::PolygonSoup;

fn random_soup(rng: &mut oorandom::Rand64, num_faces: usize) -> PolygonSoup {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut face_sizes = Vec::new();

    for _ in 0..num_faces {
        let origin = Point::new(
            rng.rand_float() * 20.0 - 10.0,
            rng.rand_float() * 20.0 - 10.0,
            rng.rand_float() * 20.0 - 10.0,
        );
        let size = 3 + rng.rand_range(0..2) as u32;

        for _ in 0..size {
            indices.push(vertices.len() as u32);
            vertices.push(
                origin
                    + na::Vector3::new(rng.rand_float(), rng.rand_float(), rng.rand_float()),
            );
        }
        face_sizes.push(size);
    }

    PolygonSoup::new(vertices, indices, &face_sizes, &[])
}

fn assert_leaves_contain_faces(soup: &AabbPolygonSoup) {
    let bvh = soup.bvh();
    bvh.assert_well_formed();

    for node in bvh.nodes().iter().filter(|n| n.is_leaf()) {
        for face in bvh.leaf_primitives(node) {
            for pt in soup.soup().face_vertices(*face as usize) {
                assert!(
                    node.aabb.contains_local_point(&pt),
                    "Leaf {:?} does not contain vertex {:?} of face {}.",
                    node.aabb,
                    pt,
                    face
                );
            }
        }
    }
}

#[test]
fn random_soup_leaves_contain_their_faces() {
    let mut rng = oorandom::Rand64::new(42);

    for num_faces in [1, 2, 5, 17, 100, 1000] {
        for optimized in [false, true] {
            let soup = AabbPolygonSoup::new(random_soup(&mut rng, num_faces), optimized);
            assert_eq!(soup.bvh().primitive_indices().len(), num_faces);
            assert_leaves_contain_faces(&soup);
        }
    }
}

#[test]
fn aabb_query_finds_every_overlapping_face() {
    let mut rng = oorandom::Rand64::new(7);
    let soup = AabbPolygonSoup::new(random_soup(&mut rng, 500), true);

    for _ in 0..20 {
        let center = Point::new(
            rng.rand_float() * 20.0 - 10.0,
            rng.rand_float() * 20.0 - 10.0,
            rng.rand_float() * 20.0 - 10.0,
        );
        let query = Aabb::from_half_extents(center, na::Vector3::repeat(2.0 as Real));

        let mut found = Vec::new();
        soup.for_all_sectors(&query, |face| {
            found.push(face);
            true
        });
        found.sort_unstable();

        let expected: Vec<u32> = (0..soup.soup().face_count() as u32)
            .filter(|i| {
                let aabb = soup.soup().face_aabb(*i as usize);
                (0..3).all(|k| aabb.mins[k] <= query.maxs[k] && aabb.maxs[k] >= query.mins[k])
            })
            .collect();

        assert_eq!(found, expected);
    }
}
