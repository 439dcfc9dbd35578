//! Shapes supported by the geometry kernel.

pub use self::polygon_soup::{newell_normal, PolygonSoup};
pub use self::segment::{Segment, SegmentPointLocation};
pub use self::triangle::{Triangle, TrianglePointLocation};

mod polygon_soup;
mod segment;
mod triangle;
