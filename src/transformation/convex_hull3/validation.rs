use super::TriangleFacet;
use crate::math::{Point, Real};

pub fn check_facet_links(ifacet: usize, facets: &[TriangleFacet]) {
    let facet = &facets[ifacet];

    for i in 0..3 {
        assert!(facets[facet.adj[i]].valid);
    }

    for i in 0..3 {
        let adj_facet = &facets[facet.adj[i]];

        assert_eq!(adj_facet.adj[facet.indirect_adj_id[i]], ifacet);
        assert_eq!(adj_facet.indirect_adj_id[facet.indirect_adj_id[i]], i);
        assert_eq!(
            adj_facet.first_point_from_edge(facet.indirect_adj_id[i]),
            facet.second_point_from_edge(i)
        );
        assert_eq!(
            adj_facet.second_point_from_edge(facet.indirect_adj_id[i]),
            facet.first_point_from_edge(i)
        );
    }
}

/// Checks if a convex-hull is properly formed.
///
/// Panics if the mesh has duplicate points, degenerate triangles, an edge shared by more
/// than two triangles, an open edge, or if it is not a topological sphere.
pub fn check_convex_hull(points: &[Point<Real>], triangles: &[[u32; 3]]) {
    use crate::utils::hashmap::{Entry, HashMap};
    use crate::utils::SortedPair;
    let mut edges: HashMap<SortedPair<u32>, [usize; 2]> = HashMap::default();

    for i in 0..points.len() {
        for j in i + 1..points.len() {
            assert_ne!(points[i], points[j], "Found duplicate points.");
        }
    }

    for (itri, tri) in triangles.iter().enumerate() {
        assert!(tri[0] != tri[1]);
        assert!(tri[0] != tri[2]);
        assert!(tri[2] != tri[1]);

        for i in 0..3 {
            let ivtx1 = tri[i];
            let ivtx2 = tri[(i + 1) % 3];

            match edges.entry(SortedPair::new(ivtx1, ivtx2)) {
                Entry::Vacant(e) => {
                    let _ = e.insert([itri, usize::MAX]);
                }
                Entry::Occupied(mut e) => {
                    assert_eq!(
                        e.get()[1],
                        usize::MAX,
                        "Detected t-junction for triangle {}, edge: {:?}.",
                        itri,
                        (ivtx1, ivtx2)
                    );

                    e.get_mut()[1] = itri;
                }
            }
        }
    }

    for adjacent in edges.values() {
        assert_ne!(adjacent[1], usize::MAX, "Detected unfinished triangle.");
    }

    // Check Euler characteristic.
    assert_eq!(points.len() + triangles.len() - edges.len(), 2);
}

/// Checks the face adjacency of a convex hull.
///
/// Panics if `adj` is not symmetric or does not match the shared edges.
pub fn check_hull_adjacency(hull: &super::ConvexHull) {
    let faces = hull.faces();

    for (i, face) in faces.iter().enumerate() {
        for k in 0..3 {
            let adj = &faces[face.adj[k] as usize];
            let a = face.indices[k];
            let b = face.indices[(k + 1) % 3];
            let back = (0..3).find(|j| adj.indices[*j] == b && adj.indices[(*j + 1) % 3] == a);

            match back {
                Some(back) => assert_eq!(adj.adj[back] as usize, i),
                None => panic!("Missing twin of edge ({}, {}) of face {}.", a, b, i),
            }
        }
    }
}
