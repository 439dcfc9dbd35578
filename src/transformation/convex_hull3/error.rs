/// Errors that can occur during convex hull computation.
///
/// [`ConvexHull::new`](super::ConvexHull::new) never reports them: it returns a hull with
/// zero faces instead. Use [`ConvexHull::try_new`](super::ConvexHull::try_new) to know why
/// a hull is empty.
///
/// ```
/// use hacd3d::math::Point;
/// use hacd3d::transformation::{ConvexHull, ConvexHullError};
///
/// let coplanar = [
///     Point::new(0.0, 0.0, 0.0),
///     Point::new(1.0, 0.0, 0.0),
///     Point::new(0.0, 1.0, 0.0),
///     Point::new(1.0, 1.0, 0.0),
/// ];
///
/// let err = ConvexHull::try_new(&coplanar, 0.0, 64).unwrap_err();
/// assert_eq!(err, ConvexHullError::MissingSupportPoint);
/// assert_eq!(ConvexHull::new(&coplanar, 0.0, 64).faces().len(), 0);
/// ```
#[derive(thiserror::Error, Debug, PartialEq, Eq, Copy, Clone)]
pub enum ConvexHullError {
    /// The algorithm could not find a valid support point.
    ///
    /// The input points are coincident, collinear, or coplanar, so they do not enclose
    /// any volume.
    #[error("Input points are almost coplanar.")]
    MissingSupportPoint,

    /// Less than 4 points were given to the convex-hull algorithm.
    #[error("Less than 4 points were given to the convex-hull algorithm.")]
    IncompleteInput,

    /// At least one input point has a NaN or infinite coordinate.
    #[error("Input points contain NaN or infinite coordinates.")]
    NonFiniteInput,
}
