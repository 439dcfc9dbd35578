use hacd3d::math::{Point, Real};
use hacd3d::transformation::{check_convex_hull, check_hull_adjacency, ConvexHull};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_cloud(rng: &mut StdRng, len: usize, scale: Real) -> Vec<Point<Real>> {
    (0..len)
        .map(|_| {
            Point::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ) * scale
        })
        .collect()
}

#[test]
fn hull_contains_random_clouds() {
    let mut rng = StdRng::seed_from_u64(0);

    for len in [4, 10, 100, 1000] {
        for scale in [1.0e-2, 1.0, 1.0e3] {
            let points = random_cloud(&mut rng, len, scale);
            let hull = ConvexHull::new(&points, 0.0, usize::MAX);
            assert!(!hull.is_empty());

            let triangles: Vec<_> = hull.triangles().collect();
            check_convex_hull(hull.vertices(), &triangles);
            check_hull_adjacency(&hull);

            let tolerance = scale * 1.0e-9;
            for pt in &points {
                assert!(
                    hull.contains_point(pt, tolerance),
                    "Point {:?} outside of the hull of {} points.",
                    pt,
                    len
                );
            }
        }
    }
}

#[test]
fn max_vertices_is_respected() {
    let mut rng = StdRng::seed_from_u64(1);
    let points = random_cloud(&mut rng, 2000, 1.0);

    for max_vertices in [4, 8, 32] {
        let hull = ConvexHull::new(&points, 0.0, max_vertices);
        assert!(!hull.is_empty());
        assert!(hull.vertices().len() <= max_vertices);
    }
}

#[test]
fn flat_cloud_has_no_hull() {
    let mut rng = StdRng::seed_from_u64(2);
    let points: Vec<_> = random_cloud(&mut rng, 50, 1.0)
        .into_iter()
        .map(|pt| Point::new(pt.x, pt.y, 0.0))
        .collect();

    let hull = ConvexHull::new(&points, 0.0, usize::MAX);
    assert!(hull.is_empty());
    assert!(!hull.contains_point(&Point::origin(), 1.0));
}
