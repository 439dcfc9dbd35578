use crate::math::{Point, Real, Vector};
use crate::query::{PointProjection, PointQuery, PointQueryWithLocation};
use crate::shape::{Triangle, TrianglePointLocation};

#[inline]
fn compute_result(pt: &Point<Real>, proj: Point<Real>) -> PointProjection {
    PointProjection::new(relative_eq!(proj, *pt), proj)
}

impl PointQuery for Triangle {
    #[inline]
    fn project_local_point(&self, pt: &Point<Real>, solid: bool) -> PointProjection {
        self.project_local_point_and_get_location(pt, solid).0
    }
}

enum ProjectionInfo {
    OnAB,
    OnAC,
    OnBC,
    // The u32 indicates if we are on the CW side (0) or CCW side (1) of the face.
    OnFace(u32, Real, Real, Real),
}

// Checks on which edge voronoï region the point is, using explicit cross products that are
// more numerically stable than the dot-product formulation.
fn stable_check_edges_voronoi(
    ab: &Vector<Real>,
    ac: &Vector<Real>,
    bc: &Vector<Real>,
    ap: &Vector<Real>,
    bp: &Vector<Real>,
    cp: &Vector<Real>,
    dots: [Real; 6],
) -> ProjectionInfo {
    let [ab_ap, ab_bp, ac_ap, ac_cp, ac_bp, ab_cp] = dots;
    let n = ab.cross(ac);

    let vc = n.dot(&ab.cross(ap));
    if vc < 0.0 && ab_ap >= 0.0 && ab_bp <= 0.0 {
        return ProjectionInfo::OnAB;
    }

    let vb = -n.dot(&ac.cross(cp));
    if vb < 0.0 && ac_ap >= 0.0 && ac_cp <= 0.0 {
        return ProjectionInfo::OnAC;
    }

    let va = n.dot(&bc.cross(bp));
    if va < 0.0 && ac_bp - ab_bp >= 0.0 && ab_cp - ac_cp >= 0.0 {
        return ProjectionInfo::OnBC;
    }

    let side = if n.dot(ap) >= 0.0 { 0 } else { 1 };
    ProjectionInfo::OnFace(side, va, vb, vc)
}

impl PointQueryWithLocation for Triangle {
    type Location = TrianglePointLocation;

    fn project_local_point_and_get_location(
        &self,
        pt: &Point<Real>,
        solid: bool,
    ) -> (PointProjection, Self::Location) {
        let a = self.a;
        let b = self.b;
        let c = self.c;

        let ab = b - a;
        let ac = c - a;
        let ap = pt - a;

        let ab_ap = ab.dot(&ap);
        let ac_ap = ac.dot(&ap);

        if ab_ap <= 0.0 && ac_ap <= 0.0 {
            // Voronoï region of `a`.
            return (compute_result(pt, a), TrianglePointLocation::OnVertex(0));
        }

        let bp = pt - b;
        let ab_bp = ab.dot(&bp);
        let ac_bp = ac.dot(&bp);

        if ab_bp >= 0.0 && ac_bp <= ab_bp {
            // Voronoï region of `b`.
            return (compute_result(pt, b), TrianglePointLocation::OnVertex(1));
        }

        let cp = pt - c;
        let ab_cp = ab.dot(&cp);
        let ac_cp = ac.dot(&cp);

        if ac_cp >= 0.0 && ab_cp <= ac_cp {
            // Voronoï region of `c`.
            return (compute_result(pt, c), TrianglePointLocation::OnVertex(2));
        }

        let bc = c - b;
        let dots = [ab_ap, ab_bp, ac_ap, ac_cp, ac_bp, ab_cp];

        match stable_check_edges_voronoi(&ab, &ac, &bc, &ap, &bp, &cp, dots) {
            ProjectionInfo::OnAB => {
                let v = ab_ap / ab.norm_squared();
                let res = a + ab * v;
                (
                    compute_result(pt, res),
                    TrianglePointLocation::OnEdge(0, [1.0 - v, v]),
                )
            }
            ProjectionInfo::OnAC => {
                let w = ac_ap / ac.norm_squared();
                let res = a + ac * w;
                (
                    compute_result(pt, res),
                    TrianglePointLocation::OnEdge(2, [1.0 - w, w]),
                )
            }
            ProjectionInfo::OnBC => {
                let w = bc.dot(&bp) / bc.norm_squared();
                let res = b + bc * w;
                (
                    compute_result(pt, res),
                    TrianglePointLocation::OnEdge(1, [1.0 - w, w]),
                )
            }
            ProjectionInfo::OnFace(side, va, vb, vc) => {
                // NOTE: the denominator may vanish when the triangle is nearly degenerate.
                let denom = va + vb + vc;

                if denom != 0.0 {
                    let v = vb / denom;
                    let w = vc / denom;
                    let res = a + ab * v + ac * w;

                    (
                        compute_result(pt, res),
                        TrianglePointLocation::OnFace(side, [1.0 - v - w, v, w]),
                    )
                } else if solid {
                    (
                        PointProjection::new(true, *pt),
                        TrianglePointLocation::OnSolid,
                    )
                } else {
                    // Degenerate triangle: fall back to its closest edge.
                    closest_edge_projection(self, pt)
                }
            }
        }
    }
}

fn closest_edge_projection(
    triangle: &Triangle,
    pt: &Point<Real>,
) -> (PointProjection, TrianglePointLocation) {
    let edges = triangle.edges();
    let mut best = (Real::MAX, 0, Point::origin(), 0.0);

    for (i, edge) in edges.iter().enumerate() {
        let dir = edge.scaled_direction();
        let sqn = dir.norm_squared();
        let t = if sqn > 0.0 {
            ((pt - edge.a).dot(&dir) / sqn).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let proj = edge.a + dir * t;
        let dist = na::distance_squared(pt, &proj);

        if dist < best.0 {
            best = (dist, i, proj, t);
        }
    }

    let (_, i, proj, t) = best;
    // `edges()` yields CA last, while locations index AC.
    let location = match i {
        0 => TrianglePointLocation::OnEdge(0, [1.0 - t, t]),
        1 => TrianglePointLocation::OnEdge(1, [1.0 - t, t]),
        _ => TrianglePointLocation::OnEdge(2, [t, 1.0 - t]),
    };

    (PointProjection::new(true, proj), location)
}

#[cfg(test)]
mod test {
    use crate::math::Point;
    use crate::query::{PointQuery, PointQueryWithLocation};
    use crate::shape::{Triangle, TrianglePointLocation};

    fn triangle() -> Triangle {
        Triangle::new(
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        )
    }

    #[test]
    fn project_on_face_interior() {
        let tri = triangle();
        let pt = Point::new(0.5, 0.5, 3.0);
        let (proj, loc) = tri.project_local_point_and_get_location(&pt, false);

        assert_relative_eq!(proj.point, Point::new(0.5, 0.5, 0.0));
        assert!(loc.is_on_face());
        let bcoords = loc.barycentric_coordinates().unwrap();
        assert_relative_eq!(bcoords[0], 0.5);
        assert_relative_eq!(bcoords[1], 0.25);
        assert_relative_eq!(bcoords[2], 0.25);
    }

    #[test]
    fn project_on_vertices_and_edges() {
        let tri = triangle();

        let (_, loc) =
            tri.project_local_point_and_get_location(&Point::new(-1.0, -1.0, 0.0), false);
        assert!(matches!(loc, TrianglePointLocation::OnVertex(0)));

        let (proj, loc) =
            tri.project_local_point_and_get_location(&Point::new(2.0, 2.0, 0.0), false);
        assert!(matches!(loc, TrianglePointLocation::OnEdge(1, _)));
        assert_relative_eq!(proj.point, Point::new(1.0, 1.0, 0.0));

        let (proj, loc) =
            tri.project_local_point_and_get_location(&Point::new(-1.0, 1.0, 1.0), false);
        assert!(matches!(loc, TrianglePointLocation::OnEdge(2, _)));
        assert_relative_eq!(proj.point, Point::new(0.0, 1.0, 0.0));

        let dist = tri.distance_to_local_point(&Point::new(0.5, 0.5, -2.0), true);
        assert_relative_eq!(dist, 2.0);
    }
}
