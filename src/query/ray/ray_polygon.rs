use crate::math::{Point, Real, Vector};
use crate::query::Ray;
use crate::utils::orient3d;

/// Casts a ray on the front side of a planar convex polygon.
///
/// The polygon vertices must be given in counter-clockwise order around `normal`. Only rays
/// travelling against `normal` can hit, and they must cross the polygon plane strictly
/// inside every edge: a ray passing exactly through an edge or a vertex misses.
pub fn ray_convex_polygon(
    ray: &Ray,
    vertices: &[Point<Real>],
    normal: &Vector<Real>,
    max_toi: Real,
) -> Option<Real> {
    if vertices.len() < 3 {
        return None;
    }

    let d = normal.dot(&ray.dir);

    if d >= 0.0 {
        return None;
    }

    let toi = normal.dot(&(vertices[0] - ray.origin)) / d;

    if toi < 0.0 || toi > max_toi {
        return None;
    }

    let target = ray.origin + ray.dir;
    let mut prev = vertices[vertices.len() - 1];

    for curr in vertices {
        if orient3d(&ray.origin, &target, &prev, curr) <= 0.0 {
            return None;
        }

        prev = *curr;
    }

    Some(toi)
}
