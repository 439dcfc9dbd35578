use core::mem;

use crate::bounding_volume::Aabb;
use crate::math::{Real, DIM};
use crate::query::{Ray, RayCast};
use num::Zero;

impl RayCast for Aabb {
    fn cast_local_ray(&self, ray: &Ray, max_toi: Real, solid: bool) -> Option<Real> {
        let mut tmin: Real = 0.0;
        let mut tmax: Real = max_toi;

        for i in 0usize..DIM {
            if ray.dir[i].is_zero() {
                if ray.origin[i] < self.mins[i] || ray.origin[i] > self.maxs[i] {
                    return None;
                }
            } else {
                let denom = 1.0 / ray.dir[i];
                let mut inter_with_near_halfspace = (self.mins[i] - ray.origin[i]) * denom;
                let mut inter_with_far_halfspace = (self.maxs[i] - ray.origin[i]) * denom;

                if inter_with_near_halfspace > inter_with_far_halfspace {
                    mem::swap(
                        &mut inter_with_near_halfspace,
                        &mut inter_with_far_halfspace,
                    )
                }

                tmin = tmin.max(inter_with_near_halfspace);
                tmax = tmax.min(inter_with_far_halfspace);

                if tmin > tmax {
                    // This covers the case where tmax is negative because tmin is
                    // initialized at zero.
                    return None;
                }
            }
        }

        if tmin.is_zero() && !solid {
            Some(tmax)
        } else {
            Some(tmin)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Vector};
    use crate::query::{Ray, RayCast};

    #[test]
    fn ray_aabb_axis_aligned() {
        let aabb = Aabb::new(Point::new(-0.5, -0.5, -0.5), Point::new(0.5, 0.5, 0.5));
        let ray = Ray::new(Point::new(-10.0, 0.0, 0.0), Vector::new(20.0, 0.0, 0.0));

        let toi = aabb.cast_local_ray(&ray, 1.0, true).unwrap();
        assert_relative_eq!(toi, 0.475);

        // Parallel to the slab, outside of it.
        let ray = Ray::new(Point::new(-10.0, 2.0, 0.0), Vector::new(20.0, 0.0, 0.0));
        assert!(!aabb.intersects_local_ray(&ray, 1.0));

        // Too short.
        let ray = Ray::new(Point::new(-10.0, 0.0, 0.0), Vector::x());
        assert!(aabb.cast_local_ray(&ray, 9.0, true).is_none());
    }

    #[test]
    fn ray_aabb_from_inside() {
        let aabb = Aabb::new(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Point::origin(), Vector::y());

        assert_eq!(aabb.cast_local_ray(&ray, 10.0, true), Some(0.0));
        assert_eq!(aabb.cast_local_ray(&ray, 10.0, false), Some(1.0));
    }
}
