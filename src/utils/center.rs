use crate::math::{Point, Real};

/// Computes the center of a set of point.
///
/// Returns the origin if `pts` is empty.
#[inline]
pub fn center(pts: &[Point<Real>]) -> Point<Real> {
    if pts.is_empty() {
        return Point::origin();
    }

    let denom = 1.0 / pts.len() as Real;
    pts.iter()
        .fold(Point::origin(), |acc, pt| acc + pt.coords * denom)
}
