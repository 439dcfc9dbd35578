use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::partitioning::Bvh;
use crate::query::{ray_convex_polygon, Ray};
use crate::shape::PolygonSoup;
use crate::transformation::convex_hull_utils::indexed_support_point_id;

/// A polygon soup indexed by a [`Bvh`] over its face AABBs.
///
/// Faces are called sectors in the query names: every query reports the index of the
/// face in the wrapped [`PolygonSoup`].
#[derive(Clone, Debug)]
pub struct AabbPolygonSoup {
    soup: PolygonSoup,
    bvh: Bvh,
}

impl AabbPolygonSoup {
    /// Indexes the given soup.
    ///
    /// If `optimized_build` is `true`, the tree is refined with [`Bvh::improve_fitness`]
    /// after the top-down build.
    pub fn new(soup: PolygonSoup, optimized_build: bool) -> Self {
        let leaves: Vec<_> = (0..soup.face_count()).map(|i| soup.face_aabb(i)).collect();
        let mut bvh = Bvh::from_leaves(&leaves);

        if optimized_build {
            let passes = bvh.improve_fitness();
            log::debug!(
                "Polygon soup BVH: {} faces, depth {}, {} fitness passes.",
                soup.face_count(),
                bvh.depth(),
                passes
            );
        }

        AabbPolygonSoup { soup, bvh }
    }

    /// The indexed polygon soup.
    #[inline]
    pub fn soup(&self) -> &PolygonSoup {
        &self.soup
    }

    /// The spatial index over the faces of the soup.
    #[inline]
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Calls `callback` with every face whose AABB intersects `aabb`.
    ///
    /// The traversal stops early if `callback` returns `false`.
    pub fn for_all_sectors(&self, aabb: &Aabb, mut callback: impl FnMut(u32) -> bool) {
        use crate::bounding_volume::BoundingVolume;

        for face in self.bvh.intersect_aabb(aabb) {
            if self.soup.face_aabb(face as usize).intersects(aabb) && !callback(face) {
                return;
            }
        }
    }

    /// Casts the segment `p0 -> p1` on the front side of the faces of the soup.
    ///
    /// `filter(face)` may discard faces before they are tested. Returns the closest face hit
    /// and the hit parameter in `[0, 1]` along the segment.
    pub fn for_all_sectors_ray_hit(
        &self,
        p0: &Point<Real>,
        p1: &Point<Real>,
        mut filter: impl FnMut(u32) -> bool,
    ) -> Option<(u32, Real)> {
        let ray = Ray::from_segment(*p0, *p1);

        self.bvh.cast_ray(&ray, 1.0, |face, best| {
            if !filter(face) {
                return None;
            }

            let vertices = self.soup.face_vertices(face as usize);
            let normal = self.soup.face_normal(face as usize);
            ray_convex_polygon(&ray, &vertices, &normal, best)
        })
    }

    /// The vertex of the soup with the largest projection on `dir`.
    pub fn for_all_sectors_support_vertex(&self, dir: &Vector<Real>) -> Option<Point<Real>> {
        let vertices = self.soup.vertices();
        let best_vertex = |face: u32| {
            indexed_support_point_id(
                dir,
                vertices,
                self.soup.face(face as usize).iter().map(|i| *i as usize),
            )
        };

        let (face, _) = self.bvh.support_primitive(dir, |face| {
            best_vertex(face)
                .map(|i| vertices[i].coords.dot(dir))
                .unwrap_or(-Real::MAX)
        })?;

        best_vertex(face).map(|i| vertices[i])
    }
}
