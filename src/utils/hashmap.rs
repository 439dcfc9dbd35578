//! The hash-map used by mesh welding and edge lookups.

pub use hashbrown::hash_map::Entry;
pub use hashbrown::HashMap;
pub use hashbrown::HashSet;
