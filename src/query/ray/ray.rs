//! Traits and structure needed to cast rays.

use crate::math::{Point, Real, Vector};

/// A Ray.
///
/// The direction does not need to be normalized: times of impact are expressed in multiples
/// of `dir`, so a segment `p0 -> p1` is the ray `Ray::new(p0, p1 - p0)` with a max toi of 1.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Ray {
    /// Starting point of the ray.
    pub origin: Point<Real>,
    /// Direction of the ray.
    pub dir: Vector<Real>,
}

impl Ray {
    /// Creates a new ray starting from `origin` and with the direction `dir`.
    pub fn new(origin: Point<Real>, dir: Vector<Real>) -> Ray {
        Ray { origin, dir }
    }

    /// The ray going from `a` to `b`, reaching `b` at time 1.
    pub fn from_segment(a: Point<Real>, b: Point<Real>) -> Ray {
        Ray::new(a, b - a)
    }

    /// Computes the point at the given parameter on this line.
    ///
    /// This computes `self.origin + self.dir * t`.
    #[inline]
    pub fn point_at(&self, t: Real) -> Point<Real> {
        self.origin + self.dir * t
    }
}

/// Traits of objects which can be intersected by a ray, expressed in the local frame of
/// the object.
pub trait RayCast {
    /// Computes the time of impact between this shape and a ray.
    ///
    /// If `solid` is `false`, a ray starting inside of the shape reports the time at which
    /// it leaves it instead of `0.0`.
    fn cast_local_ray(&self, ray: &Ray, max_toi: Real, solid: bool) -> Option<Real>;

    /// Tests whether a ray intersects this shape.
    #[inline]
    fn intersects_local_ray(&self, ray: &Ray, max_toi: Real) -> bool {
        self.cast_local_ray(ray, max_toi, true).is_some()
    }
}
