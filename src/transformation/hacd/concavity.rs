//! Concavity and cost measurements of candidate merges.

use super::cluster_graph::{fan_triangles, Cluster};
use super::task_runner::TriangleTask;
use crate::math::{Point, Real, Vector};
use crate::shape::Triangle;
use crate::transformation::half_edge::HalfEdgeMesh;
use crate::transformation::ConvexHull;
use arrayvec::ArrayVec;

/// The weight of the concavity in the merge cost.
pub const CONCAVITY_SCALE: Real = 100.0;

/// The cost added to the merge of two coplanar clusters facing opposite directions.
pub const CREASE_PENALTY: Real = 10.0 * CONCAVITY_SCALE;

/// Concavities below this value are considered zero.
pub const CONCAVITY_FLOOR: Real = 1.0e-3;

// The number of rays cast per triangle, the first on the triangle itself and the others on
// the corner triangles of its successive subdivisions.
const MAX_RAYS_PER_TRIANGLE: usize = 5;
// Triangles are subdivided while the squared norm of their scaled normal exceeds
// `MIN_SUBDIVISION_AREA^2 / 2`.
const MIN_SUBDIVISION_AREA: Real = 0.125;

/// The distance between a triangle and the boundary of `hull`, along the triangle normal.
///
/// Rays are cast from `4 * diagonal` outside of the hull towards the centers of the
/// triangle and of the corner triangles of its first subdivisions. The concavity is the
/// largest distance between a center and the point where its ray enters the hull.
pub fn triangle_concavity(hull: &ConvexHull, task: &TriangleTask, diagonal: Real) -> Real {
    let step = task.normal * (4.0 * diagonal);
    let step_len = step.norm();
    let min_area_sq = MIN_SUBDIVISION_AREA * MIN_SUBDIVISION_AREA * 0.5;

    let mut queue: ArrayVec<Triangle, { 4 * MAX_RAYS_PER_TRIANGLE }> = ArrayVec::new();
    queue.push(task.triangle);
    let mut head = 0;
    let mut guess = None;
    let mut concavity: Real = 0.0;

    while head < queue.len() && head < MAX_RAYS_PER_TRIANGLE {
        let triangle = queue[head];
        head += 1;

        let q1 = triangle.center();
        let q0 = q1 + step;
        let t = hull.ray_cast(&q0, &q1, &mut guess).min(1.0);
        concavity = concavity.max(step_len * (1.0 - t));

        if triangle.scaled_normal().norm_squared() > min_area_sq {
            let [a, b, c, _] = triangle.subdivide();
            for sub in [a, b, c] {
                let _ = queue.try_push(sub);
            }
        }
    }

    concavity
}

/// The triangles of the faces of `cluster` with the normals of their faces.
pub fn cluster_tasks(mesh: &HalfEdgeMesh, cluster: &Cluster, out: &mut Vec<TriangleTask>) {
    for face in &cluster.faces {
        out.extend(
            fan_triangles(mesh, face.edge).map(|triangle| TriangleTask {
                triangle,
                normal: face.normal,
            }),
        );
    }
}

/// Tests if every vertex of `cluster` lies within `tolerance` of the plane through
/// `origin` orthogonal to `normal`.
pub fn is_coplanar(
    mesh: &HalfEdgeMesh,
    cluster: &Cluster,
    origin: &Point<Real>,
    normal: &Vector<Real>,
    tolerance: Real,
) -> bool {
    cluster.faces.iter().all(|face| {
        mesh.face_loop(face.edge).all(|e| {
            let pt = mesh.vertices()[mesh.edge(e).vertex as usize];
            (pt - origin).dot(normal).abs() <= tolerance
        })
    })
}

/// Tests if a face of `cluster` faces away from `normal`.
pub fn has_opposed_face(cluster: &Cluster, normal: &Vector<Real>) -> bool {
    cluster.faces.iter().any(|face| face.normal.dot(normal) < 0.0)
}

/// The length of the edges of `cluster` that are not shared with `color_a` or `color_b`.
pub fn cluster_perimeter(mesh: &HalfEdgeMesh, cluster: &Cluster, color_a: u32, color_b: u32) -> Real {
    let mut perimeter = 0.0;

    for face in &cluster.faces {
        for e in mesh.face_loop(face.edge) {
            let edge = mesh.edge(e);
            let twin = mesh.edge(edge.twin);

            if twin.face != Some(color_a) && twin.face != Some(color_b) {
                perimeter += na::distance(
                    &mesh.vertices()[edge.vertex as usize],
                    &mesh.vertices()[twin.vertex as usize],
                );
            }
        }
    }

    perimeter
}

/// The cost of a cluster of the given concavity, area, and perimeter made of
/// `faces_a + faces_b` faces out of `total_faces`.
pub fn concavity_metric(
    concavity: Real,
    area: Real,
    perimeter: Real,
    faces_a: usize,
    faces_b: usize,
    total_faces: usize,
) -> Real {
    let edge_cost = if area > 0.0 {
        perimeter * perimeter / (4.0 * core::f64::consts::PI * area)
    } else {
        0.0
    };
    let face_count_cost =
        CONCAVITY_SCALE * 0.1 * (faces_a + faces_b) as Real / total_faces.max(1) as Real;

    concavity * CONCAVITY_SCALE + edge_cost + face_count_cost
}

#[cfg(test)]
mod test {
    use super::{concavity_metric, triangle_concavity, CONCAVITY_SCALE};
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Vector};
    use crate::shape::Triangle;
    use crate::transformation::hacd::TriangleTask;
    use crate::transformation::ConvexHull;

    fn unit_cube_hull() -> ConvexHull {
        let aabb = Aabb::new(Point::new(-0.5, -0.5, -0.5), Point::new(0.5, 0.5, 0.5));
        ConvexHull::new(&aabb.vertices(), 0.0, 64)
    }

    #[test]
    fn triangle_on_hull_boundary_is_not_concave() {
        let hull = unit_cube_hull();
        let task = TriangleTask {
            triangle: Triangle::new(
                Point::new(-0.5, -0.5, 0.5),
                Point::new(0.5, -0.5, 0.5),
                Point::new(0.5, 0.5, 0.5),
            ),
            normal: Vector::z(),
        };
        assert!(triangle_concavity(&hull, &task, 3.0f64.sqrt()) < 1.0e-6);
    }

    #[test]
    fn inner_triangle_concavity() {
        let hull = unit_cube_hull();
        let task = TriangleTask {
            triangle: Triangle::new(
                Point::new(-0.1, -0.1, 0.2),
                Point::new(0.1, -0.1, 0.2),
                Point::new(0.0, 0.1, 0.2),
            ),
            normal: Vector::z(),
        };
        let concavity = triangle_concavity(&hull, &task, 3.0f64.sqrt());
        assert_relative_eq!(concavity, 0.3, epsilon = 1.0e-6);

        // Rays along the normal that miss the hull measure nothing.
        let outside = TriangleTask {
            triangle: Triangle::new(
                Point::new(2.0, 2.0, 0.0),
                Point::new(2.1, 2.0, 0.0),
                Point::new(2.0, 2.1, 0.0),
            ),
            normal: Vector::z(),
        };
        assert_eq!(triangle_concavity(&hull, &outside, 3.0f64.sqrt()), 0.0);
    }

    #[test]
    fn metric_terms() {
        // A unit disk has the smallest perimeter for its area.
        let pi = core::f64::consts::PI;
        let disk = concavity_metric(0.0, pi, 2.0 * pi, 1, 1, 20);
        assert_relative_eq!(disk, 1.0 + CONCAVITY_SCALE * 0.1 * 0.1);

        let concave = concavity_metric(0.5, pi, 2.0 * pi, 1, 1, 20);
        assert_relative_eq!(concave - disk, 0.5 * CONCAVITY_SCALE);
    }
}
