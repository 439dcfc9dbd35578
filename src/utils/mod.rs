//! Various unsorted geometrical and logical operators.

pub use self::center::center;
pub use self::cleanup::remove_unused_points;
pub use self::cov::{center_cov, cov};
pub use self::predicates::orient3d;
pub use self::sorted_pair::SortedPair;

mod center;
mod cleanup;
mod cov;
mod predicates;
pub mod hashmap;
pub mod point_in_triangle;
mod sorted_pair;
