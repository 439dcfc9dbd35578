//! Point inclusion and projection.

#[doc(inline)]
pub use self::point_query::{PointProjection, PointQuery, PointQueryWithLocation};

#[doc(hidden)]
pub mod point_query;
mod point_segment;
mod point_triangle;
