use crate::math::{Point, Real};
use crate::query::{PointProjection, PointQuery, PointQueryWithLocation};
use crate::shape::{Segment, SegmentPointLocation};

impl PointQuery for Segment {
    #[inline]
    fn project_local_point(&self, pt: &Point<Real>, solid: bool) -> PointProjection {
        self.project_local_point_and_get_location(pt, solid).0
    }
}

impl PointQueryWithLocation for Segment {
    type Location = SegmentPointLocation;

    #[inline]
    fn project_local_point_and_get_location(
        &self,
        pt: &Point<Real>,
        _: bool,
    ) -> (PointProjection, Self::Location) {
        let ab = self.b - self.a;
        let ap = pt - self.a;
        let ab_ap = ab.dot(&ap);
        let sqnab = ab.norm_squared();

        let proj;
        let location;

        if ab_ap <= 0.0 {
            // Voronoï region of vertex 'a'.
            location = SegmentPointLocation::OnVertex(0);
            proj = self.a;
        } else if ab_ap >= sqnab {
            // Voronoï region of vertex 'b'.
            location = SegmentPointLocation::OnVertex(1);
            proj = self.b;
        } else {
            // Voronoï region of the segment interior.
            let u = ab_ap / sqnab;
            location = SegmentPointLocation::OnEdge([1.0 - u, u]);
            proj = self.a + ab * u;
        }

        let inside = relative_eq!(proj, *pt);

        (PointProjection::new(inside, proj), location)
    }
}

#[cfg(test)]
mod test {
    use crate::math::Point;
    use crate::query::{PointQuery, PointQueryWithLocation};
    use crate::shape::{Segment, SegmentPointLocation};

    #[test]
    fn segment_voronoi_regions() {
        let seg = Segment::new(Point::new(0.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0));

        let pt = Point::new(-1.0, 1.0, 0.0);
        let (proj, loc) = seg.project_local_point_and_get_location(&pt, true);
        assert_eq!(loc, SegmentPointLocation::OnVertex(0));
        assert_eq!(proj.point, seg.a);

        let pt = Point::new(0.5, 1.0, 0.0);
        let (proj, loc) = seg.project_local_point_and_get_location(&pt, true);
        assert_eq!(loc, SegmentPointLocation::OnEdge([0.75, 0.25]));
        assert_eq!(proj.point, Point::new(0.5, 0.0, 0.0));
        assert!(!proj.is_inside);

        assert_eq!(seg.distance_to_local_point(&Point::new(3.0, 0.0, 0.0), true), 1.0);
        assert!(seg.contains_local_point(&Point::new(1.0, 0.0, 0.0)));
    }
}
