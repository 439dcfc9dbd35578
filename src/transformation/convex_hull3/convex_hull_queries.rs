use super::ConvexHull;
use crate::math::{Point, Real, Vector};
use crate::query::{line_triangle_intersection, PointProjection, PointQuery, Ray, RayCast};
use core::cmp::Reverse;
use ordered_float::OrderedFloat;
use alloc::collections::BinaryHeap;

/// The parameter returned by [`ConvexHull::ray_cast`] when the segment misses the hull.
pub const NO_HIT: Real = 1.2;

// Faces with more than this count start the ray walk from the face closest to the segment
// entry point into the AABB instead of the first face.
const WALK_FROM_CLOSEST_FACE_THRESHOLD: usize = 32;

// The entering parameter along a face plane, and the projection of the segment direction on
// the face normal. Leaving faces have a positive projection.
#[derive(Copy, Clone, Debug)]
struct FaceHit {
    t: Real,
    normal_projection: Real,
}

impl ConvexHull {
    fn face_ray_cast(&self, face: usize, origin: &Point<Real>, dir: &Vector<Real>) -> FaceHit {
        let [i0, i1, i2] = self.faces[face].indices;
        let p0 = self.points[i0 as usize];
        let normal = (self.points[i1 as usize] - p0).cross(&(self.points[i2 as usize] - p0));

        let n = (origin - p0).dot(&normal);
        let d = dir.dot(&normal);

        if d.abs() < 1.0e-16 {
            // Parallel to the face: the whole line is either outside or inside its plane.
            FaceHit {
                t: if n > 0.0 { -Real::MAX } else { Real::MAX },
                normal_projection: 0.0,
            }
        } else {
            FaceHit {
                t: -n / d,
                normal_projection: d,
            }
        }
    }

    /// Casts the segment `p0 -> p1` on this hull by walking its face adjacency.
    ///
    /// Returns the parameter in `[0, 1]` at which the segment enters the hull, or a value
    /// greater than 1 ([`NO_HIT`]) if it does not enter it. `guess` is the face the walk
    /// starts from: it is updated to the face hit, so casting parallel rays in sequence
    /// takes a roughly constant time.
    pub fn ray_cast(&self, p0: &Point<Real>, p1: &Point<Real>, guess: &mut Option<u32>) -> Real {
        let num_faces = self.faces.len();
        if num_faces == 0 {
            return NO_HIT;
        }

        let ray = Ray::from_segment(*p0, *p1);
        let Some(entry) = self.aabb.cast_local_ray(&ray, 1.0, true) else {
            return NO_HIT;
        };

        let start = match *guess {
            Some(face) if (face as usize) < num_faces => face as usize,
            _ if num_faces > WALK_FROM_CLOSEST_FACE_THRESHOLD => self
                .closest_face_to_point(&ray.point_at(entry))
                .unwrap_or(0),
            _ => 0,
        };

        let dir = ray.dir;
        let mut tested = vec![false; num_faces];
        let mut heap = BinaryHeap::new();
        let mut t0 = -Real::MAX; // The largest entering parameter.
        let mut t1 = Real::MAX; // The smallest leaving parameter.

        let push = |heap: &mut BinaryHeap<_>, face: usize, hit: FaceHit| {
            let key = if hit.normal_projection >= 0.0 {
                -Real::MAX
            } else {
                hit.t
            };
            heap.push((
                OrderedFloat(key),
                face,
                OrderedFloat(hit.t),
                OrderedFloat(hit.normal_projection),
            ));
        };

        tested[start] = true;
        push(&mut heap, start, self.face_ray_cast(start, p0, &dir));

        while let Some((OrderedFloat(t), face, OrderedFloat(face_t), OrderedFloat(projection))) =
            heap.pop()
        {
            let mut found_best_face = true;

            if projection < 0.0 {
                t0 = t0.max(t);
            } else {
                found_best_face = false;
                if projection > 0.0 {
                    t1 = t1.min(face_t);
                }
            }

            if t0 > t1 {
                return NO_HIT;
            }

            for adj in self.faces[face].adj {
                let adj = adj as usize;
                if adj >= num_faces || tested[adj] {
                    continue;
                }

                tested[adj] = true;
                let hit = self.face_ray_cast(adj, p0, &dir);

                if hit.normal_projection < 0.0 {
                    if hit.t > t0 {
                        found_best_face = false;
                    } else if (hit.t - t0).abs() < 1.0e-10 {
                        // Coplanar neighbors or a segment crossing an edge.
                        return self.clip_segment_with_guess(p0, p1, guess);
                    }
                }

                push(&mut heap, adj, hit);
            }

            if found_best_face {
                if !(0.0..=1.0).contains(&t0) {
                    return NO_HIT;
                }

                if line_triangle_intersection(p0, p1, &self.triangle(face), true).is_some() {
                    *guess = Some(face as u32);
                    return t0;
                }

                log::debug!(
                    "Convex hull ray cast: local entry face {} rejected, clipping against all {} faces.",
                    face,
                    num_faces
                );
                return self.clip_segment_with_guess(p0, p1, guess);
            }
        }

        NO_HIT
    }

    fn clip_segment_with_guess(
        &self,
        p0: &Point<Real>,
        p1: &Point<Real>,
        guess: &mut Option<u32>,
    ) -> Real {
        match self.clip_segment_and_get_face(p0, p1) {
            Some((t, face)) => {
                *guess = Some(face as u32);
                t
            }
            None => NO_HIT,
        }
    }

    /// Casts the segment `p0 -> p1` on this hull by clipping it against every face plane.
    ///
    /// Returns the entering parameter in `[0, 1]`, or [`NO_HIT`].
    pub fn clip_segment(&self, p0: &Point<Real>, p1: &Point<Real>) -> Real {
        self.clip_segment_and_get_face(p0, p1)
            .map(|(t, _)| t)
            .unwrap_or(NO_HIT)
    }

    /// Casts the segment `p0 -> p1` on this hull by clipping it against every face plane.
    ///
    /// Returns the entering parameter in `[0, 1]` together with the face the segment enters
    /// through.
    pub fn clip_segment_and_get_face(
        &self,
        p0: &Point<Real>,
        p1: &Point<Real>,
    ) -> Option<(Real, usize)> {
        let dir = p1 - p0;
        let mut t0 = -Real::MAX;
        let mut t1 = Real::MAX;
        let mut entering = None;

        for face in 0..self.faces.len() {
            let hit = self.face_ray_cast(face, p0, &dir);

            if hit.normal_projection < 0.0 {
                if hit.t > t0 || entering.is_none() {
                    t0 = t0.max(hit.t);
                    entering = Some(face);
                }
            } else if hit.normal_projection > 0.0 {
                t1 = t1.min(hit.t);
            } else if hit.t < 0.0 {
                // Parallel and outside.
                return None;
            }

            if t0 > t1 {
                return None;
            }
        }

        let face = entering?;
        (0.0..=1.0).contains(&t0).then_some((t0, face))
    }

    /// The face with the vertex closest to `point`, found by a descent over the face
    /// adjacency.
    ///
    /// The descent is only reliable if `point` is already close to the hull, e.g., projected
    /// on its AABB. Returns `None` if the hull has no faces.
    pub fn closest_face_to_point(&self, point: &Point<Real>) -> Option<usize> {
        if self.faces.is_empty() {
            return None;
        }

        let face_dist = |face: usize| {
            self.faces[face]
                .indices
                .iter()
                .map(|i| na::distance_squared(&self.points[*i as usize], point))
                .fold(Real::MAX, Real::min)
        };

        let mut visited = vec![false; self.faces.len()];
        let mut heap = BinaryHeap::new();
        let mut closest = 0;
        let mut min_dist = face_dist(0);
        heap.push(Reverse((OrderedFloat(min_dist), 0)));

        while let Some(Reverse((OrderedFloat(dist), face))) = heap.pop() {
            if dist < min_dist {
                min_dist = dist;
                closest = face;
            }

            visited[face] = true;

            for adj in self.faces[face].adj {
                let adj = adj as usize;
                if adj >= self.faces.len() || visited[adj] {
                    continue;
                }

                // Hysteresis, to avoid stopping at the first local minimum.
                let dist = face_dist(adj);
                if dist < min_dist * 1.001 {
                    visited[adj] = true;
                    heap.push(Reverse((OrderedFloat(dist), adj)));
                }
            }
        }

        Some(closest)
    }

    /// Is `point` inside of this hull, or closer than `tolerance` to its boundary?
    ///
    /// Always `false` for a hull without faces.
    pub fn contains_point(&self, point: &Point<Real>, tolerance: Real) -> bool {
        !self.faces.is_empty()
            && self.faces.iter().all(|face| {
                let origin = self.points[face.indices[0] as usize];
                face.normal.dot(&(point - origin)) <= tolerance
            })
    }
}

impl PointQuery for ConvexHull {
    fn project_local_point(&self, pt: &Point<Real>, solid: bool) -> PointProjection {
        let is_inside = self.contains_point(pt, 0.0);

        if is_inside && solid {
            return PointProjection::new(true, *pt);
        }

        let mut best = PointProjection::new(is_inside, *pt);
        let mut best_dist = Real::MAX;

        for i in 0..self.faces.len() {
            let proj = self.triangle(i).project_local_point(pt, false);
            let dist = na::distance_squared(pt, &proj.point);

            if dist < best_dist {
                best_dist = dist;
                best.point = proj.point;
            }
        }

        best
    }
}
