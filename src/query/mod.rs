//! Non-persistent geometric queries.
//!
//! # General cases
//! The most general methods provided by this module are:
//!
//! * [`RayCast`] to cast a ray on a shape or a bounding volume.
//! * [`PointQuery`] to project a point on a shape, with [`PointQueryWithLocation`] to also
//!   retrieve the feature (vertex, edge, or face interior) the projection lies on.
//! * [`closest_points::closest_points_segment_segment_with_locations`] for the closest points
//!   between two segments.

pub use self::point::{PointProjection, PointQuery, PointQueryWithLocation};
pub use self::ray::{line_triangle_intersection, ray_convex_polygon, Ray, RayCast};

pub mod closest_points;
pub mod point;
mod ray;
