use crate::math::{Point, Real};

/// Given an index buffer, remove from `points` every point that is not indexed, and remaps the
/// indices so they stay valid.
pub fn remove_unused_points(points: &mut Vec<Point<Real>>, idx: &mut [[u32; 3]]) {
    let mut remap = vec![u32::MAX; points.len()];

    for tri in idx.iter() {
        for &i in tri {
            remap[i as usize] = 0;
        }
    }

    let mut kept = 0;
    for i in 0..points.len() {
        if remap[i] != u32::MAX {
            points[kept] = points[i];
            remap[i] = kept as u32;
            kept += 1;
        }
    }

    points.truncate(kept);

    for tri in idx.iter_mut() {
        for i in tri.iter_mut() {
            *i = remap[*i as usize];
        }
    }
}
