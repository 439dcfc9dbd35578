use hacd3d::bounding_volume::Aabb;
use hacd3d::math::{Point, Real, Transform};
use hacd3d::partitioning::AabbPolygonSoup;
use hacd3d::transformation::polygon_soup::PolygonSoupBuilder;
use hacd3d::transformation::ConvexHull;

fn unit_cube() -> Aabb {
    Aabb::new(Point::new(-0.5, -0.5, -0.5), Point::new(0.5, 0.5, 0.5))
}

fn hit_point(p0: &Point<Real>, p1: &Point<Real>, t: Real) -> Point<Real> {
    p0 + (p1 - p0) * t
}

#[test]
fn hull_ray_cast() {
    let hull = ConvexHull::new(&unit_cube().vertices(), 0.0, 64);
    let p0 = Point::new(-10.0, 0.0, 0.0);
    let p1 = Point::new(10.0, 0.0, 0.0);

    let mut guess = None;
    let t = hull.ray_cast(&p0, &p1, &mut guess);
    assert!(guess.is_some());
    assert_relative_eq!(
        hit_point(&p0, &p1, t),
        Point::new(-0.5, 0.0, 0.0),
        epsilon = 1.0e-4
    );

    // Parallel rays reuse the face hit by the previous one.
    let q0 = Point::new(-10.0, 0.25, 0.1);
    let q1 = Point::new(10.0, 0.25, 0.1);
    let t = hull.ray_cast(&q0, &q1, &mut guess);
    assert_relative_eq!(hit_point(&q0, &q1, t).x, -0.5, epsilon = 1.0e-4);

    // A segment stopping before the hull does not hit it.
    let t = hull.ray_cast(&p0, &Point::new(-1.0, 0.0, 0.0), &mut None);
    assert!(t > 1.0);
}

#[test]
fn polygon_soup_ray_cast() {
    let vertices = unit_cube().vertices();
    // Outward quads of the cube, in the vertex order of `Aabb::vertices`.
    let indices = [
        0, 3, 2, 1, // z = -0.5
        4, 5, 6, 7, // z = 0.5
        0, 1, 5, 4, // y = -0.5
        2, 3, 7, 6, // y = 0.5
        1, 2, 6, 5, // x = 0.5
        0, 4, 7, 3, // x = -0.5
    ];

    let mut builder = PolygonSoupBuilder::new();
    builder.begin();
    let accepted = builder.add_mesh(&vertices, &indices, &[4; 6], &[], &Transform::identity());
    assert_eq!(accepted, 6);
    let soup = AabbPolygonSoup::new(builder.end(true), true);
    soup.bvh().assert_well_formed();

    let p0 = Point::new(-10.0, 0.0, 0.0);
    let p1 = Point::new(10.0, 0.0, 0.0);
    let (face, t) = soup.for_all_sectors_ray_hit(&p0, &p1, |_| true).unwrap();
    assert_relative_eq!(
        hit_point(&p0, &p1, t),
        Point::new(-0.5, 0.0, 0.0),
        epsilon = 1.0e-4
    );
    assert_relative_eq!(
        soup.soup().face_normal(face as usize),
        -na::Vector3::x(),
        epsilon = 1.0e-6
    );

    // Back faces are never hit: from the inside the ray only exits the cube.
    assert!(soup
        .for_all_sectors_ray_hit(&Point::origin(), &p1, |_| true)
        .is_none());

    let support = soup
        .for_all_sectors_support_vertex(&na::Vector3::new(1.0, 1.0, 1.0))
        .unwrap();
    assert_eq!(support, Point::new(0.5, 0.5, 0.5));
}
