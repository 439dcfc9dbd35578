extern crate nalgebra as na;
#[macro_use]
extern crate approx;

mod bvh_containment;
mod convex_hull_containment;
mod degenerate_polygons;
mod hacd_decomposition;
mod meshes;
mod ray_cast_cube;
