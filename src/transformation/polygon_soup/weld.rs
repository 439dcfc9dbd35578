use crate::math::{Point, Real};
use crate::utils::hashmap::HashMap;
use smallvec::SmallVec;

/// Merges the points closer than `tolerance` to each other.
///
/// Returns the welded points and, for each input point, the index of the welded point it was
/// merged into. Each welded point is located at the first input point merged into it. Points
/// are bucketed in a hashed grid with cells of size `tolerance`, so only the 27 cells around a
/// point are searched. If `tolerance` is zero or negative, only identical points are merged.
pub fn weld_vertices(points: &[Point<Real>], tolerance: Real) -> (Vec<Point<Real>>, Vec<u32>) {
    let mut welded = Vec::new();
    let mut remap = Vec::with_capacity(points.len());

    if tolerance <= 0.0 || !tolerance.is_finite() {
        let mut exact: HashMap<[u64; 3], u32> = HashMap::default();

        for pt in points {
            // +0.0 and -0.0 must land in the same bucket.
            let key = pt.coords.map(|x| (x + 0.0).to_bits()).into();
            let id = *exact.entry(key).or_insert_with(|| {
                welded.push(*pt);
                welded.len() as u32 - 1
            });
            remap.push(id);
        }

        return (welded, remap);
    }

    let inv_cell = 1.0 / tolerance;
    let tolerance_sq = tolerance * tolerance;
    let mut grid: HashMap<[i64; 3], SmallVec<[u32; 2]>> = HashMap::default();

    for pt in points {
        let cell = pt.coords.map(|x| (x * inv_cell).floor() as i64);
        let mut found = None;

        'search: for i in -1..=1 {
            for j in -1..=1 {
                for k in -1..=1 {
                    let key = [cell.x + i, cell.y + j, cell.z + k];
                    let Some(bucket) = grid.get(&key) else {
                        continue;
                    };

                    if let Some(id) = bucket
                        .iter()
                        .find(|id| na::distance_squared(&welded[**id as usize], pt) <= tolerance_sq)
                    {
                        found = Some(*id);
                        break 'search;
                    }
                }
            }
        }

        let id = found.unwrap_or_else(|| {
            welded.push(*pt);
            let id = welded.len() as u32 - 1;
            grid.entry([cell.x, cell.y, cell.z]).or_default().push(id);
            id
        });
        remap.push(id);
    }

    (welded, remap)
}
