use crate::math::{Point, Real};
use crate::query::{Ray, RayCast};
use crate::shape::Triangle;
use crate::utils::orient3d;

/// Intersects the segment `p0 -> p1` with a triangle.
///
/// Returns the parameter `t` in `[0, 1]` of the intersection point `p0 + (p1 - p0) * t`.
/// If `front_only` is `true`, only segments entering the triangle from the side its
/// counter-clockwise normal points to are reported.
///
/// Every sidedness test is an [`orient3d`] predicate, so nearly parallel or nearly
/// degenerate configurations are settled in extended precision. A segment crossing exactly
/// an edge or a vertex of the triangle is reported as a hit.
pub fn line_triangle_intersection(
    p0: &Point<Real>,
    p1: &Point<Real>,
    triangle: &Triangle,
    front_only: bool,
) -> Option<Real> {
    let Triangle { a, b, c } = triangle;

    // Negative on the side of the normal.
    let s0 = orient3d(a, b, c, p0);
    let s1 = orient3d(a, b, c, p1);

    if (s0 < 0.0 && s1 < 0.0) || (s0 > 0.0 && s1 > 0.0) || s0 == s1 {
        return None;
    }

    if front_only && s0 > s1 {
        return None;
    }

    if !line_crosses_triangle_edges(p0, p1, triangle) {
        return None;
    }

    Some(s0 / (s0 - s1))
}

fn line_crosses_triangle_edges(p0: &Point<Real>, p1: &Point<Real>, triangle: &Triangle) -> bool {
    let e0 = orient3d(p0, p1, &triangle.a, &triangle.b);
    let e1 = orient3d(p0, p1, &triangle.b, &triangle.c);
    let e2 = orient3d(p0, p1, &triangle.c, &triangle.a);

    let all_pos = e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0;
    let all_neg = e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0;

    (all_pos || all_neg) && !(e0 == 0.0 && e1 == 0.0 && e2 == 0.0)
}

impl RayCast for Triangle {
    #[inline]
    fn cast_local_ray(&self, ray: &Ray, max_toi: Real, _: bool) -> Option<Real> {
        let n = self.scaled_normal();
        let d = n.dot(&ray.dir);

        // The normal and the ray direction are orthogonal.
        if d == 0.0 {
            return None;
        }

        let toi = n.dot(&(self.a - ray.origin)) / d;

        if toi < 0.0 || toi > max_toi {
            return None;
        }

        if line_crosses_triangle_edges(&ray.origin, &(ray.origin + ray.dir), self) {
            Some(toi)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::line_triangle_intersection;
    use crate::math::{Point, Vector};
    use crate::query::{Ray, RayCast};
    use crate::shape::Triangle;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn segment_through_triangle() {
        let tri = unit_triangle();
        let above = Point::new(0.25, 0.25, 1.0);
        let below = Point::new(0.25, 0.25, -3.0);

        assert_eq!(line_triangle_intersection(&above, &below, &tri, true), Some(0.25));
        assert_eq!(line_triangle_intersection(&below, &above, &tri, true), None);
        assert_eq!(line_triangle_intersection(&below, &above, &tri, false), Some(0.75));
    }

    #[test]
    fn segment_missing_triangle() {
        let tri = unit_triangle();
        let above = Point::new(0.75, 0.75, 1.0);
        let below = Point::new(0.75, 0.75, -1.0);
        assert_eq!(line_triangle_intersection(&above, &below, &tri, false), None);

        // Stops before the plane.
        let short = Point::new(0.25, 0.25, 0.5);
        let above = Point::new(0.25, 0.25, 1.0);
        assert_eq!(line_triangle_intersection(&above, &short, &tri, false), None);
    }

    #[test]
    fn segment_through_shared_edge_hits() {
        let tri = unit_triangle();
        let above = Point::new(0.5, 0.5, 1.0);
        let below = Point::new(0.5, 0.5, -1.0);
        assert_eq!(line_triangle_intersection(&above, &below, &tri, true), Some(0.5));
    }

    #[test]
    fn ray_triangle_toi() {
        let tri = unit_triangle();
        let ray = Ray::new(Point::new(0.2, 0.2, 4.0), -Vector::z());
        assert_eq!(tri.cast_local_ray(&ray, 10.0, true), Some(4.0));
        assert_eq!(tri.cast_local_ray(&ray, 3.0, true), None);

        let ray = Ray::new(Point::new(2.0, 2.0, 4.0), -Vector::z());
        assert_eq!(tri.cast_local_ray(&ray, 10.0, true), None);
    }
}
