use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, Vector};
use crate::partitioning::{Bvh, TraversalAction};
use crate::query::{Ray, RayCast};

fn make_test_aabb(i: usize) -> Aabb {
    Aabb::from_half_extents(Vector::repeat(i as Real).into(), Vector::repeat(1.0))
}

fn random_aabbs(rng: &mut oorandom::Rand64, len: usize) -> Vec<Aabb> {
    (0..len)
        .map(|_| {
            let center = Point::new(
                rng.rand_float() * 20.0 - 10.0,
                rng.rand_float() * 20.0 - 10.0,
                rng.rand_float() * 20.0 - 10.0,
            );
            let half_extents = Vector::new(
                rng.rand_float() + 0.01,
                rng.rand_float() + 0.01,
                rng.rand_float() + 0.01,
            );
            Aabb::from_half_extents(center, half_extents)
        })
        .collect()
}

#[test]
fn bvh_build_and_optimize() {
    // The tree validity is asserted for every size, before and after the fitness pass.
    for len in 0..=100 {
        let leaves: Vec<_> = (0..len).map(make_test_aabb).collect();
        let mut bvh = Bvh::from_leaves(&leaves);
        bvh.assert_well_formed();
        bvh.assert_leaves_contain(&leaves);

        let cost_before = bvh.total_cost();
        let _ = bvh.improve_fitness();
        bvh.assert_well_formed();
        bvh.assert_leaves_contain(&leaves);
        assert!(bvh.total_cost() <= cost_before);
    }
}

#[test]
fn bvh_random_leaves_are_contained() {
    let mut rng = oorandom::Rand64::new(42);

    for len in [1, 3, 17, 256, 1000] {
        let leaves = random_aabbs(&mut rng, len);
        let mut bvh = Bvh::from_leaves(&leaves);
        bvh.assert_leaves_contain(&leaves);
        let _ = bvh.improve_fitness();
        bvh.assert_well_formed();
        bvh.assert_leaves_contain(&leaves);
    }
}

#[test]
fn bvh_aabb_query_matches_brute_force() {
    let mut rng = oorandom::Rand64::new(7);
    let leaves = random_aabbs(&mut rng, 500);
    let bvh = Bvh::from_leaves(&leaves);

    for query in random_aabbs(&mut rng, 50) {
        let mut found: Vec<_> = bvh
            .intersect_aabb(&query)
            .filter(|i| leaves[*i as usize].intersects(&query))
            .collect();
        found.sort_unstable();
        let expected: Vec<_> = (0..leaves.len() as u32)
            .filter(|i| leaves[*i as usize].intersects(&query))
            .collect();
        assert_eq!(found, expected);
    }
}

#[test]
fn bvh_ray_cast_matches_brute_force() {
    let mut rng = oorandom::Rand64::new(1234);
    let leaves = random_aabbs(&mut rng, 300);
    let mut bvh = Bvh::from_leaves(&leaves);
    let _ = bvh.improve_fitness();

    for _ in 0..100 {
        let origin = Point::new(-20.0, rng.rand_float() * 20.0 - 10.0, rng.rand_float() * 4.0);
        let ray = Ray::new(origin, Vector::new(40.0, rng.rand_float() - 0.5, 0.0));

        let hit = bvh.cast_ray(&ray, 1.0, |i, best| {
            leaves[i as usize].cast_local_ray(&ray, best, true)
        });
        let expected = leaves
            .iter()
            .filter_map(|aabb| aabb.cast_local_ray(&ray, 1.0, true))
            .min_by(|a, b| a.total_cmp(b));

        assert_eq!(hit.map(|h| h.1), expected);
    }
}

#[test]
fn bvh_support_primitive_matches_brute_force() {
    let mut rng = oorandom::Rand64::new(99);
    let leaves = random_aabbs(&mut rng, 400);
    let bvh = Bvh::from_leaves(&leaves);

    for _ in 0..50 {
        let dir = Vector::new(
            rng.rand_float() - 0.5,
            rng.rand_float() - 0.5,
            rng.rand_float() - 0.5,
        );
        let (_, value) = bvh
            .support_primitive(&dir, |i| leaves[i as usize].support_value(&dir))
            .unwrap();
        let expected = leaves
            .iter()
            .map(|aabb| aabb.support_value(&dir))
            .fold(-Real::MAX, Real::max);
        assert_eq!(value, expected);
    }
}

#[test]
fn bvh_traverse_early_exit() {
    let leaves: Vec<_> = (0..64).map(make_test_aabb).collect();
    let bvh = Bvh::from_leaves(&leaves);
    let mut visited = 0;

    bvh.traverse(|node| {
        visited += 1;
        if node.is_leaf() {
            TraversalAction::EarlyExit
        } else {
            TraversalAction::Continue
        }
    });

    assert_eq!(visited as u32, bvh.depth());
}
