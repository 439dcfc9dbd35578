//! Ray-casting related definitions and implementations.

#[doc(inline)]
pub use self::ray::{Ray, RayCast};
pub use self::ray_polygon::ray_convex_polygon;
pub use self::ray_triangle::line_triangle_intersection;

#[doc(hidden)]
pub mod ray;
mod ray_aabb;
mod ray_polygon;
mod ray_triangle;
