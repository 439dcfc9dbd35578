use hacd3d::math::{Point, Real, Vector};
use hacd3d::shape::newell_normal;
use hacd3d::transformation::half_edge::HalfEdgeMesh;

// Adds a polygon, flipping it if it does not face `outward`.
fn add_oriented(mesh: &mut HalfEdgeMesh, mut points: Vec<Point<Real>>, outward: &Vector<Real>) {
    if newell_normal(&points).dot(outward) < 0.0 {
        points.reverse();
    }
    let _ = mesh.add_polygon(&points, 0);
}

// Adds the 6 faces of a box, except the one on the `skip` side (axis, sign).
fn add_box_faces(
    mesh: &mut HalfEdgeMesh,
    center: Point<Real>,
    half_extents: Vector<Real>,
    skip: Option<(usize, Real)>,
) {
    for k in 0..3 {
        for s in [-1.0, 1.0] {
            if skip == Some((k, s)) {
                continue;
            }

            let (u, v) = ((k + 1) % 3, (k + 2) % 3);
            let corner = |a: Real, b: Real| {
                let mut pt = center;
                pt[k] += s * half_extents[k];
                pt[u] += a * half_extents[u];
                pt[v] += b * half_extents[v];
                pt
            };
            let mut outward = Vector::zeros();
            outward[k] = s;

            add_oriented(
                mesh,
                vec![
                    corner(-1.0, -1.0),
                    corner(1.0, -1.0),
                    corner(1.0, 1.0),
                    corner(-1.0, 1.0),
                ],
                &outward,
            );
        }
    }
}

/// A unit cube centered at the origin.
pub fn cube() -> HalfEdgeMesh {
    let mut mesh = HalfEdgeMesh::new();
    mesh.begin_polygon();
    add_box_faces(&mut mesh, Point::origin(), Vector::repeat(0.5), None);
    mesh.end_polygon(1.0e-6);
    mesh
}

/// A closed 1 x 1 x 0.02 slab. Its two large faces share no edge.
pub fn thin_slab() -> HalfEdgeMesh {
    let mut mesh = HalfEdgeMesh::new();
    mesh.begin_polygon();
    add_box_faces(
        &mut mesh,
        Point::origin(),
        Vector::new(0.5, 0.5, 0.01),
        None,
    );
    mesh.end_polygon(1.0e-6);
    mesh
}

/// Two unit cubes centered at x = 0 and x = 3, joined by a bar with a 0.1 square section.
pub fn two_cubes_with_bridge() -> HalfEdgeMesh {
    const BRIDGE: Real = 0.05;
    let square = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut mesh = HalfEdgeMesh::new();
    mesh.begin_polygon();
    add_box_faces(&mut mesh, Point::origin(), Vector::repeat(0.5), Some((0, 1.0)));
    add_box_faces(
        &mut mesh,
        Point::new(3.0, 0.0, 0.0),
        Vector::repeat(0.5),
        Some((0, -1.0)),
    );

    // The faces of the cubes pierced by the bridge, as rings of 4 trapezoids.
    for (x, sign) in [(0.5, 1.0), (2.5, -1.0)] {
        for i in 0..4 {
            let (a0, b0) = square[i];
            let (a1, b1) = square[(i + 1) % 4];
            add_oriented(
                &mut mesh,
                vec![
                    Point::new(x, 0.5 * a0, 0.5 * b0),
                    Point::new(x, 0.5 * a1, 0.5 * b1),
                    Point::new(x, BRIDGE * a1, BRIDGE * b1),
                    Point::new(x, BRIDGE * a0, BRIDGE * b0),
                ],
                &Vector::new(sign, 0.0, 0.0),
            );
        }
    }

    // The sides of the bridge.
    for k in 1..3 {
        let other = 3 - k;
        for s in [-1.0, 1.0] {
            let corner = |x: Real, b: Real| {
                let mut pt = Point::new(x, 0.0, 0.0);
                pt[k] = s * BRIDGE;
                pt[other] = b * BRIDGE;
                pt
            };
            let mut outward = Vector::zeros();
            outward[k] = s;

            add_oriented(
                &mut mesh,
                vec![
                    corner(0.5, -1.0),
                    corner(2.5, -1.0),
                    corner(2.5, 1.0),
                    corner(0.5, 1.0),
                ],
                &outward,
            );
        }
    }

    mesh.end_polygon(1.0e-6);
    mesh
}

/// A unit sphere made of 6 latitude bands and 8 meridians.
pub fn sphere() -> HalfEdgeMesh {
    const BANDS: usize = 6;
    const MERIDIANS: usize = 8;

    let ring = |i: usize| -> Vec<Point<Real>> {
        let theta = core::f64::consts::PI * i as Real / BANDS as Real;
        (0..MERIDIANS)
            .map(|j| {
                let phi = 2.0 * core::f64::consts::PI * j as Real / MERIDIANS as Real;
                Point::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                )
            })
            .collect()
    };
    let north = Point::new(0.0, 0.0, 1.0);
    let south = Point::new(0.0, 0.0, -1.0);

    let mut mesh = HalfEdgeMesh::new();
    mesh.begin_polygon();

    let mut add = |points: Vec<Point<Real>>| {
        let center = points.iter().map(|pt| pt.coords).sum::<Vector<Real>>();
        add_oriented(&mut mesh, points, &center);
    };

    for i in 1..BANDS {
        let upper = ring(i);
        let lower = ring(i + 1);

        for j in 0..MERIDIANS {
            let next = (j + 1) % MERIDIANS;

            if i == 1 {
                add(vec![north, upper[j], upper[next]]);
            }

            if i == BANDS - 1 {
                add(vec![south, upper[next], upper[j]]);
            } else {
                add(vec![upper[j], lower[j], lower[next], upper[next]]);
            }
        }
    }

    mesh.end_polygon(1.0e-6);
    mesh
}
