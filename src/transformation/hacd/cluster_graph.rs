//! The dual graph of the faces of a mesh, whose nodes are clusters of faces.

use crate::math::{Point, Real, Transform, Vector};
use crate::partitioning::AabbPolygonSoup;
use crate::shape::Triangle;
use crate::transformation::half_edge::{EdgeId, HalfEdgeMesh};
use crate::transformation::polygon_soup::PolygonSoupBuilder;
use smallvec::SmallVec;

/// A face of a cluster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClusterFace {
    /// A half-edge of the face loop.
    pub edge: EdgeId,
    /// The area of the face.
    pub area: Real,
    /// The unit normal of the face.
    pub normal: Vector<Real>,
}

/// A connected set of mesh faces.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// The color of the faces of this cluster: the index of its node in the graph.
    pub color: u32,
    /// The faces of this cluster.
    pub faces: Vec<ClusterFace>,
    /// The total area of the faces.
    pub area: Real,
    /// The look-ahead tree node recording the merge history of this cluster.
    pub tree: u32,
}

/// How two clusters became adjacent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdjacencyKind {
    /// The clusters share a mesh edge.
    Topological,
    /// A face of one cluster sees the inner side of a face of the other cluster at a short
    /// distance.
    Proximity,
}

impl AdjacencyKind {
    /// The factor applied to the perimeter of a merge across this adjacency.
    #[inline]
    pub fn back_face_handicap(self) -> Real {
        match self {
            AdjacencyKind::Topological => 1.0,
            AdjacencyKind::Proximity => 0.5,
        }
    }
}

/// An edge of the cluster graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClusterEdge {
    /// The adjacent node.
    pub neighbor: u32,
    /// The origin of the adjacency.
    pub kind: AdjacencyKind,
    /// The merge candidate of this edge, if any is pending.
    pub proxy: Option<u32>,
}

/// A node of the cluster graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    /// The faces of this node.
    pub cluster: Cluster,
    /// The adjacency list of this node.
    pub edges: Vec<ClusterEdge>,
}

impl ClusterNode {
    /// The edge of this node leading to `neighbor`.
    pub fn edge_to(&self, neighbor: u32) -> Option<&ClusterEdge> {
        self.edges.iter().find(|e| e.neighbor == neighbor)
    }

    fn edge_to_mut(&mut self, neighbor: u32) -> Option<&mut ClusterEdge> {
        self.edges.iter_mut().find(|e| e.neighbor == neighbor)
    }
}

/// The graph of clusters of the faces of a mesh.
///
/// Nodes are never moved: a node absorbed by a merge leaves an empty slot behind, so node
/// indices and face colors stay valid for the whole decomposition.
#[derive(Clone, Debug, Default)]
pub struct ClusterGraph {
    nodes: Vec<Option<ClusterNode>>,
    num_alive: usize,
}

impl ClusterGraph {
    /// Creates one cluster per face of `mesh`, linked to the clusters of the faces sharing
    /// an edge with it.
    ///
    /// Every face of `mesh` is recolored with the index of its cluster, and `add_leaf` is
    /// called on each face to get the look-ahead tree node of its cluster.
    pub fn new(mesh: &mut HalfEdgeMesh, mut add_leaf: impl FnMut(EdgeId) -> u32) -> Self {
        let faces = mesh.faces();
        let mut nodes = Vec::with_capacity(faces.len());

        for (color, edge) in faces.iter().enumerate() {
            mesh.recolor_face(*edge, color as u32);
            let scaled_normal = mesh.face_normal(*edge);
            let area = scaled_normal.norm() * 0.5;
            let normal = scaled_normal.try_normalize(0.0).unwrap_or_else(Vector::zeros);

            nodes.push(Some(ClusterNode {
                cluster: Cluster {
                    color: color as u32,
                    faces: vec![ClusterFace {
                        edge: *edge,
                        area,
                        normal,
                    }],
                    area,
                    tree: add_leaf(*edge),
                },
                edges: Vec::new(),
            }));
        }

        for (color, edge) in faces.iter().enumerate() {
            let mut neighbors: SmallVec<[u32; 8]> = SmallVec::new();

            for e in mesh.face_loop(*edge) {
                if let Some(neighbor) = mesh.edge(mesh.edge(e).twin).face {
                    if neighbor != color as u32 && !neighbors.contains(&neighbor) {
                        neighbors.push(neighbor);
                    }
                }
            }

            if let Some(node) = &mut nodes[color] {
                node.edges
                    .extend(neighbors.into_iter().map(|neighbor| ClusterEdge {
                        neighbor,
                        kind: AdjacencyKind::Topological,
                        proxy: None,
                    }));
            }
        }

        let num_alive = nodes.len();
        ClusterGraph { nodes, num_alive }
    }

    /// The number of clusters left.
    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.num_alive
    }

    /// The number of node slots, including the ones of absorbed clusters.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// The node with the given index, if it was not absorbed.
    #[inline]
    pub fn node(&self, id: u32) -> Option<&ClusterNode> {
        self.nodes.get(id as usize).and_then(|n| n.as_ref())
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: u32) -> Option<&mut ClusterNode> {
        self.nodes.get_mut(id as usize).and_then(|n| n.as_mut())
    }

    /// Iterates through the clusters left with their node index.
    pub fn nodes(&self) -> impl Iterator<Item = (u32, &ClusterNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (i as u32, n)))
    }

    /// Links `a` and `b` in both directions, unless they are already adjacent.
    ///
    /// Returns `true` if an edge was added.
    pub fn add_edge(&mut self, a: u32, b: u32, kind: AdjacencyKind) -> bool {
        if a == b
            || self.node(b).is_none()
            || self.node(a).map(|n| n.edge_to(b).is_some()).unwrap_or(true)
        {
            return false;
        }

        for (from, to) in [(a, b), (b, a)] {
            if let Some(node) = self.node_mut(from) {
                node.edges.push(ClusterEdge {
                    neighbor: to,
                    kind,
                    proxy: None,
                });
            }
        }

        true
    }

    /// Sets the merge candidate of the edge between `a` and `b`, in both directions.
    pub(crate) fn set_proxy(&mut self, a: u32, b: u32, proxy: Option<u32>) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(edge) = self.node_mut(from).and_then(|n| n.edge_to_mut(to)) {
                edge.proxy = proxy;
            }
        }
    }

    /// Removes the node `id` from the graph, unlinking it from all its neighbors.
    pub(crate) fn remove_node(&mut self, id: u32) -> Option<ClusterNode> {
        let node = self.nodes.get_mut(id as usize)?.take()?;
        self.num_alive -= 1;

        for edge in &node.edges {
            if let Some(neighbor) = self.node_mut(edge.neighbor) {
                neighbor.edges.retain(|e| e.neighbor != id);
            }
        }

        Some(node)
    }

    /// Links clusters whose faces see each other through the inside of the mesh.
    ///
    /// Four rays are cast from every triangle of the fan of each face, against the face
    /// normal and over twice `threshold`. When the closest face hit from its inner side is
    /// closer than `threshold` and belongs to a cluster that is not adjacent yet, both
    /// clusters are linked with an [`AdjacencyKind::Proximity`] edge. Returns the number
    /// of edges added.
    pub fn add_back_face_edges(&mut self, mesh: &HalfEdgeMesh, threshold: Real) -> usize {
        let soup = self.reversed_soup(mesh);
        let ray_length = threshold * 2.0;
        let mut num_added = 0;

        for a in 0..self.nodes.len() as u32 {
            let Some(node) = self.node(a) else {
                continue;
            };
            let face = node.cluster.faces[0];
            let step = face.normal * ray_length;
            let mut hits: SmallVec<[u32; 4]> = SmallVec::new();

            for triangle in fan_triangles(mesh, face.edge) {
                for sub in triangle.subdivide() {
                    let origin = sub.center();
                    let end = origin - step;
                    let hit = soup.for_all_sectors_ray_hit(&origin, &end, |f| {
                        soup.soup().face_material(f as usize) != a
                    });

                    if let Some((f, t)) = hit {
                        if t * ray_length < threshold {
                            let b = soup.soup().face_material(f as usize);
                            if !hits.contains(&b) {
                                hits.push(b);
                            }
                        }
                    }
                }
            }

            for b in hits {
                if self.add_edge(a, b, AdjacencyKind::Proximity) {
                    num_added += 1;
                }
            }
        }

        log::debug!(
            "Added {} back-face edges between {} clusters.",
            num_added,
            self.num_alive
        );
        num_added
    }

    // The faces of the clusters with reversed orientation, tagged with their cluster
    // color. Rays hit the inner side of the mesh faces first.
    fn reversed_soup(&self, mesh: &HalfEdgeMesh) -> AabbPolygonSoup {
        let mut builder = PolygonSoupBuilder::new();
        builder.begin();

        let mut vertices: Vec<Point<Real>> = Vec::new();
        let mut face_sizes = Vec::new();
        let mut materials = Vec::new();

        for (color, node) in self.nodes() {
            for face in &node.cluster.faces {
                let len = vertices.len();
                vertices.extend(
                    mesh.face_vertices(face.edge)
                        .iter()
                        .rev()
                        .map(|v| mesh.vertices()[*v as usize]),
                );
                face_sizes.push((vertices.len() - len) as u32);
                materials.push(color);
            }
        }

        let indices: Vec<u32> = (0..vertices.len() as u32).collect();
        let _ = builder.add_mesh(
            &vertices,
            &indices,
            &face_sizes,
            &materials,
            &Transform::identity(),
        );
        AabbPolygonSoup::new(builder.end(false), true)
    }
}

/// The fan triangulation of the face loop `edge` belongs to, around the origin of `edge`.
pub(crate) fn fan_triangles(
    mesh: &HalfEdgeMesh,
    edge: EdgeId,
) -> impl Iterator<Item = Triangle> + '_ {
    let vertices = mesh.face_vertices(edge);
    let pts = mesh.vertices();
    let p0 = pts[vertices[0] as usize];

    (1..vertices.len().saturating_sub(1)).map(move |i| {
        Triangle::new(
            p0,
            pts[vertices[i] as usize],
            pts[vertices[i + 1] as usize],
        )
    })
}
