use crate::math::{Point, Real};

#[inline]
fn coord(pt: &Point<Real>) -> robust::Coord3D<Real> {
    robust::Coord3D {
        x: pt.x,
        y: pt.y,
        z: pt.z,
    }
}

/// Six times the signed volume of the tetrahedron `(a, b, c, d)`.
///
/// Positive when `d` lies below the plane of the counter-clockwise triangle `(a, b, c)`,
/// that is, `(a - d) . ((b - d) x (c - d)) > 0`. The sign is exact: determinants too close
/// to zero to be trusted in `f64` are recomputed with adaptive exact arithmetic.
#[inline]
pub fn orient3d(a: &Point<Real>, b: &Point<Real>, c: &Point<Real>, d: &Point<Real>) -> Real {
    robust::orient3d(coord(a), coord(b), coord(c), coord(d))
}

#[cfg(test)]
mod test {
    use super::orient3d;
    use crate::math::Point;

    #[test]
    fn orient3d_signs() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.0, 1.0, 0.0);

        assert!(orient3d(&a, &b, &c, &Point::new(0.0, 0.0, -1.0)) > 0.0);
        assert!(orient3d(&a, &b, &c, &Point::new(0.0, 0.0, 1.0)) < 0.0);
        assert_eq!(orient3d(&a, &b, &c, &Point::new(0.3, 0.3, 0.0)), 0.0);
    }

    #[test]
    fn orient3d_nearly_coplanar() {
        // Far from the origin, barely below the plane.
        let a = Point::new(1.0e8, 1.0e8, 0.0);
        let b = Point::new(1.0e8 + 1.0, 1.0e8, 0.0);
        let c = Point::new(1.0e8, 1.0e8 + 1.0, 0.0);
        let d = Point::new(1.0e8 + 0.5, 1.0e8 + 0.5, -1.0e-9);

        assert!(orient3d(&a, &b, &c, &d) > 0.0);
        assert!(orient3d(&a, &c, &b, &d) < 0.0);
    }
}
