pub use self::convex_hull::{ConvexHull, HullFace};
pub use self::convex_hull_queries::NO_HIT;
pub use self::error::ConvexHullError;
use self::triangle_facet::TriangleFacet;
use self::validation::check_facet_links;
pub use self::validation::{check_convex_hull, check_hull_adjacency};

mod convex_hull;
mod convex_hull_queries;
mod error;
mod initial_mesh;
mod triangle_facet;
mod validation;
