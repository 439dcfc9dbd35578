use super::cluster_graph::{AdjacencyKind, ClusterGraph};
use super::concavity::{
    cluster_perimeter, cluster_tasks, concavity_metric, has_opposed_face, is_coplanar,
    triangle_concavity, CONCAVITY_FLOOR, CONCAVITY_SCALE, CREASE_PENALTY,
};
use super::look_ahead_tree::LookAheadTree;
use super::pair_proxy::{PairHeap, PairProxy};
use super::progress::{
    PHASE_COLLAPSE, PHASE_CONNECTIVITY, PHASE_COPY_MESH, PHASE_INITIAL_COSTS, PHASE_PARTITION,
};
use super::{
    ConvexDecomposition, HacdError, HacdParameters, MergeStrategy, NoProgress, ProgressReporter,
    TaskRunner, TriangleTask,
};
use crate::math::{Point, Real};
use crate::transformation::half_edge::{EdgeId, HalfEdgeMesh};
use crate::transformation::ConvexHull;
use smallvec::SmallVec;

/// The concavity of the artificial nodes joining the merge histories of disconnected
/// parts of the mesh, relative to its diagonal. It doubles for every join.
const FOREST_JOIN_CONCAVITY: Real = 10_000.0;

/// Coplanarity tolerance of clusters, relative to the mesh diagonal.
const COPLANARITY_TOLERANCE: Real = 1.0e-5;

/// The phase of a [`Hacd`] decomposition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HacdState {
    /// One cluster per face and the full adjacency graph are built.
    Initialized,
    /// Clusters are being merged.
    Merging,
    /// The convex pieces were extracted.
    Finalized,
}

/// Hierarchical approximate convex decomposition of a mesh.
///
/// Every face of the mesh starts as its own cluster. Adjacent clusters, and clusters whose
/// faces see each other at a short distance through the inside of the mesh, are merged
/// greedily by increasing cost. The cost of a merge accounts for the concavity of the
/// union of both clusters, for the compactness of its boundary, and for its face count.
/// The merge history is recorded in a [`LookAheadTree`] which is finally cut into at most
/// `max_clusters` pieces, each replaced by its convex hull.
///
/// [`convex_decomposition`](super::convex_decomposition) runs all the phases at once.
pub struct Hacd {
    state: HacdState,
    params: HacdParameters,
    mesh: HalfEdgeMesh,
    graph: ClusterGraph,
    heap: PairHeap,
    trees: LookAheadTree,
    diagonal: Real,
    total_faces: usize,
    num_merges: usize,
    vertex_marks: Vec<u32>,
    vertex_mark: u32,
    vertex_pool: Vec<Point<Real>>,
    tasks: Vec<TriangleTask>,
}

impl Hacd {
    /// Builds the cluster graph of a copy of `mesh`.
    ///
    /// Coplanar faces of the copy are first merged into convex polygons. Fails with
    /// [`HacdError::EmptyGraph`] if the mesh has no face.
    pub fn new(
        mesh: &HalfEdgeMesh,
        params: &HacdParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Self, HacdError> {
        let params = params.sanitized();

        progress.report(PHASE_COPY_MESH, 0.0);
        let mut mesh = mesh.clone();
        mesh.convex_partition();

        progress.report(PHASE_CONNECTIVITY, 0.0);
        let mut trees = LookAheadTree::new();
        let mut graph = ClusterGraph::new(&mut mesh, |face| trees.add_leaf(face, 0.0));
        let total_faces = graph.num_clusters();

        if total_faces == 0 {
            return Err(HacdError::EmptyGraph);
        }

        let diagonal = mesh.aabb().diagonal();
        let _ = graph.add_back_face_edges(&mesh, diagonal * params.back_face_distance_factor);

        Ok(Hacd {
            state: HacdState::Initialized,
            params,
            vertex_marks: vec![0; mesh.vertices().len()],
            mesh,
            graph,
            heap: PairHeap::with_capacity(total_faces + 2048),
            trees,
            diagonal,
            total_faces,
            num_merges: 0,
            vertex_mark: 0,
            vertex_pool: Vec::new(),
            tasks: Vec::new(),
        })
    }

    /// Decomposes `mesh` on the calling thread, or on the rayon thread pool if the
    /// `parallel` feature is enabled.
    pub fn decompose(
        mesh: &HalfEdgeMesh,
        params: &HacdParameters,
    ) -> Result<ConvexDecomposition, HacdError> {
        #[cfg(feature = "parallel")]
        let runner = super::RayonRunner;
        #[cfg(not(feature = "parallel"))]
        let runner = super::SerialRunner;

        super::convex_decomposition(mesh, params, &mut NoProgress, &runner)
    }

    /// Decomposes the triangle mesh with the given vertex and index buffers.
    ///
    /// Fails with [`HacdError::Mesh`] if the triangles do not form an oriented manifold,
    /// use [`HalfEdgeMesh::begin_polygon`] to build a mesh from arbitrary triangles.
    pub fn decompose_trimesh(
        vertices: &[Point<Real>],
        indices: &[[u32; 3]],
        params: &HacdParameters,
    ) -> Result<ConvexDecomposition, HacdError> {
        let mut mesh = HalfEdgeMesh::with_vertices(vertices.to_vec());
        mesh.begin_face();
        for tri in indices {
            let _ = mesh.add_face(tri, None)?;
        }
        mesh.end_face();

        Self::decompose(&mesh, params)
    }

    /// The current phase of the decomposition.
    #[inline]
    pub fn state(&self) -> HacdState {
        self.state
    }

    /// The parameters of the decomposition, once sanitized.
    #[inline]
    pub fn params(&self) -> &HacdParameters {
        &self.params
    }

    /// The mesh being decomposed. Its faces are colored with the index of their cluster.
    #[inline]
    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// The current clusters and their adjacency.
    #[inline]
    pub fn graph(&self) -> &ClusterGraph {
        &self.graph
    }

    /// The merge history of the clusters.
    #[inline]
    pub fn look_ahead_tree(&self) -> &LookAheadTree {
        &self.trees
    }

    /// The diagonal of the AABB of the mesh.
    #[inline]
    pub fn diagonal(&self) -> Real {
        self.diagonal
    }

    /// The number of merges performed so far.
    #[inline]
    pub fn num_merges(&self) -> usize {
        self.num_merges
    }

    /// The number of merge candidates in the heap, including invalidated ones.
    #[inline]
    pub fn num_pending_pairs(&self) -> usize {
        self.heap.len()
    }

    fn expect_state(&self, expected: HacdState) -> Result<(), HacdError> {
        match self.state {
            found if found == expected => Ok(()),
            HacdState::Finalized => Err(HacdError::AlreadyFinalized),
            found => Err(HacdError::InvalidState { expected, found }),
        }
    }

    /// Computes the cost of merging every pair of adjacent clusters.
    pub fn submit_initial_edge_costs(
        &mut self,
        runner: &dyn TaskRunner,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), HacdError> {
        self.expect_state(HacdState::Initialized)?;
        progress.report(PHASE_INITIAL_COSTS, 0.0);

        let pairs: Vec<_> = self
            .graph
            .nodes()
            .flat_map(|(a, node)| {
                node.edges
                    .iter()
                    .filter(move |e| e.neighbor > a)
                    .map(move |e| (a, e.neighbor))
            })
            .collect();

        for (a, b) in pairs {
            let handicap = self.pair_handicap(a, b);
            let proxy = self.submit_edge_cost(a, b, handicap, runner);
            self.graph.set_proxy(a, b, proxy);
        }

        self.state = HacdState::Merging;
        Ok(())
    }

    // The product of the back-face handicaps of both directions of the edge `a - b`.
    fn pair_handicap(&self, a: u32, b: u32) -> Real {
        let handicap = |from: u32, to: u32| {
            self.graph
                .node(from)
                .and_then(|n| n.edge_to(to))
                .map(|e| e.kind.back_face_handicap())
                .unwrap_or(AdjacencyKind::Topological.back_face_handicap())
        };
        handicap(a, b) * handicap(b, a)
    }

    /// The concavity beyond which a merge can never be accepted, if any.
    fn concavity_limit(&self) -> Real {
        match self.params.strategy {
            MergeStrategy::Hierarchical => Real::MAX,
            MergeStrategy::Greedy => self.params.max_concavity * self.diagonal,
        }
    }

    // Measures the cost of merging `a` and `b` and pushes the candidate on the heap.
    fn submit_edge_cost(
        &mut self,
        a: u32,
        b: u32,
        perimeter_handicap: Real,
        runner: &dyn TaskRunner,
    ) -> Option<u32> {
        let limit = self.concavity_limit();
        let (Some(node_a), Some(node_b)) = (self.graph.node(a), self.graph.node(b)) else {
            return None;
        };
        let (cluster_a, cluster_b) = (&node_a.cluster, &node_b.cluster);
        let mesh = &self.mesh;

        let first = cluster_a.faces[0];
        let origin = mesh.vertices()[mesh.edge(first.edge).vertex as usize];
        let tolerance = COPLANARITY_TOLERANCE * self.diagonal;
        let flat = (cluster_a.faces.len() == 1
            || is_coplanar(mesh, cluster_a, &origin, &first.normal, tolerance))
            && is_coplanar(mesh, cluster_b, &origin, &first.normal, tolerance);

        let mut concavity = 0.0;
        let mut penalty = 0.0;

        if flat {
            if has_opposed_face(cluster_a, &first.normal)
                || has_opposed_face(cluster_b, &first.normal)
            {
                penalty = CREASE_PENALTY;
            }
        } else {
            self.vertex_mark += 1;
            self.vertex_pool.clear();

            for cluster in [cluster_a, cluster_b] {
                for face in &cluster.faces {
                    for e in mesh.face_loop(face.edge) {
                        let vid = mesh.edge(e).vertex as usize;
                        if self.vertex_marks[vid] != self.vertex_mark {
                            self.vertex_marks[vid] = self.vertex_mark;
                            self.vertex_pool.push(mesh.vertices()[vid]);
                        }
                    }
                }
            }

            let hull = ConvexHull::new(&self.vertex_pool, 0.0, usize::MAX);

            if !hull.is_empty() {
                self.tasks.clear();
                cluster_tasks(mesh, cluster_a, &mut self.tasks);
                cluster_tasks(mesh, cluster_b, &mut self.tasks);

                let diagonal = self.diagonal;
                let eval = |task: &TriangleTask| triangle_concavity(&hull, task, diagonal);
                concavity = runner.run(&self.tasks, limit, &eval).join();
            }

            if concavity < CONCAVITY_FLOOR {
                concavity = 0.0;
            }
        }

        let area = cluster_a.area + cluster_b.area;
        let perimeter =
            cluster_perimeter(mesh, cluster_a, a, b) + cluster_perimeter(mesh, cluster_b, a, b);
        let cost = concavity_metric(
            concavity,
            area,
            perimeter * perimeter_handicap,
            cluster_a.faces.len(),
            cluster_b.faces.len(),
            self.total_faces,
        ) + penalty;

        let proxy = PairProxy::Valid {
            node_a: a,
            node_b: b,
            tree_a: cluster_a.tree,
            tree_b: cluster_b.tree,
            area,
            concavity,
        };

        Some(self.heap.push(proxy, cost))
    }

    /// Performs the cheapest valid merge.
    ///
    /// Returns `false` once no merge is left, or once the termination rule of
    /// [`MergeStrategy::Greedy`] is met.
    pub fn collapse_step(
        &mut self,
        runner: &dyn TaskRunner,
        progress: &mut dyn ProgressReporter,
    ) -> Result<bool, HacdError> {
        self.expect_state(HacdState::Merging)?;
        let max_cost = self.params.max_concavity * self.diagonal * CONCAVITY_SCALE;

        loop {
            if self.params.strategy == MergeStrategy::Greedy
                && self.graph.num_clusters() <= self.params.max_clusters
                && self.heap.min_cost().map(|c| c > max_cost).unwrap_or(true)
            {
                return Ok(false);
            }

            let Some((cost, proxy)) = self.heap.pop() else {
                return Ok(false);
            };

            let PairProxy::Valid {
                node_a,
                node_b,
                tree_a,
                tree_b,
                area,
                concavity,
            } = proxy
            else {
                continue;
            };

            let alive = self.graph.node(node_a).is_some() && self.graph.node(node_b).is_some();
            debug_assert!(alive, "Valid pair proxy referencing an absorbed cluster.");
            if !alive {
                continue;
            }

            self.collapse_edge(node_a, node_b, [tree_a, tree_b], area, concavity, runner);
            self.num_merges += 1;
            progress.report(
                PHASE_COLLAPSE,
                self.num_merges as Real / self.total_faces as Real,
            );
            log::trace!(
                "Merged clusters {} and {} at cost {}, concavity {}.",
                node_a,
                node_b,
                cost,
                concavity
            );
            return Ok(true);
        }
    }

    /// Merges clusters until [`Self::collapse_step`] returns `false`.
    pub fn collapse_clusters(
        &mut self,
        runner: &dyn TaskRunner,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), HacdError> {
        self.expect_state(HacdState::Merging)?;
        progress.report(PHASE_COLLAPSE, 0.0);
        while self.collapse_step(runner, progress)? {}
        Ok(())
    }

    // Merges `b` into `a`.
    fn collapse_edge(
        &mut self,
        a: u32,
        b: u32,
        trees: [u32; 2],
        area: Real,
        concavity: Real,
        runner: &dyn TaskRunner,
    ) {
        let tree = self.trees.join(trees[0], trees[1], concavity);

        // Every candidate involving `a` or `b` is obsolete.
        let mut stale: SmallVec<[(u32, u32, u32); 16]> = SmallVec::new();
        for id in [a, b] {
            if let Some(node) = self.graph.node(id) {
                stale.extend(
                    node.edges
                        .iter()
                        .filter_map(|e| e.proxy.map(|p| (id, e.neighbor, p))),
                );
            }
        }
        for (id, neighbor, proxy) in stale {
            self.heap.invalidate(proxy);
            self.graph.set_proxy(id, neighbor, None);
        }

        let Some(absorbed) = self.graph.remove_node(b) else {
            return;
        };

        for face in &absorbed.cluster.faces {
            self.mesh.recolor_face(face.edge, a);
        }

        if let Some(node) = self.graph.node_mut(a) {
            node.cluster.faces.extend_from_slice(&absorbed.cluster.faces);
            node.cluster.area = area;
            node.cluster.tree = tree;
        }

        for edge in &absorbed.edges {
            if edge.neighbor != a {
                let _ = self.graph.add_edge(a, edge.neighbor, edge.kind);
            }
        }

        let neighbors: SmallVec<[u32; 16]> = self
            .graph
            .node(a)
            .map(|n| n.edges.iter().map(|e| e.neighbor).collect())
            .unwrap_or_default();

        for neighbor in neighbors {
            let handicap = self.pair_handicap(a, neighbor);
            let proxy = self.submit_edge_cost(a, neighbor, handicap, runner);
            self.graph.set_proxy(a, neighbor, proxy);
        }
    }

    /// Cuts the merge history into convex pieces.
    ///
    /// The merge histories of disconnected parts of the mesh are joined first, dropping
    /// the single faces left unmerged. The most concave pieces are then split until
    /// `max_clusters` pieces exist, or every piece that can still be split is at most
    /// `max_concavity` concave. Each piece is replaced by its convex hull. Pieces with a
    /// degenerate hull are skipped and consume no layer.
    pub fn finalize(
        &mut self,
        progress: &mut dyn ProgressReporter,
    ) -> Result<ConvexDecomposition, HacdError> {
        self.expect_state(HacdState::Merging)?;
        progress.report(PHASE_PARTITION, 0.0);

        let all_roots: Vec<u32> = self.graph.nodes().map(|(_, n)| n.cluster.tree).collect();
        let mut roots = all_roots.clone();
        if roots.len() > 1 {
            roots.retain(|root| self.trees.node(*root).num_faces > 1);
            if roots.is_empty() {
                roots = all_roots;
            }
        }

        let mut join_concavity = FOREST_JOIN_CONCAVITY * self.diagonal.max(1.0);
        while roots.len() > 1 {
            let (Some(left), Some(right)) = (roots.pop(), roots.pop()) else {
                break;
            };
            roots.push(self.trees.join(left, right, join_concavity));
            join_concavity *= 2.0;
        }

        let Some(root) = roots.first().copied() else {
            return Err(HacdError::EmptyGraph);
        };

        let pieces = self.trees.reduce(
            root,
            self.params.max_clusters,
            self.params.max_concavity * self.diagonal,
        );

        let mut decomposition = ConvexDecomposition::new();
        for piece in &pieces {
            let faces = self.trees.faces(*piece);
            let hull = ConvexHull::new(
                &self.face_vertices(&faces),
                0.0,
                self.params.max_vertices_per_hull,
            );

            if !hull.is_empty() {
                let _ = decomposition.push_hull(hull.vertices(), hull.triangles());
            }
        }

        log::debug!(
            "HACD: {} faces merged into {} clusters after {} merges, {} convex pieces.",
            self.total_faces,
            self.graph.num_clusters(),
            self.num_merges,
            decomposition.num_hulls()
        );

        progress.report(PHASE_PARTITION, 1.0);
        self.state = HacdState::Finalized;
        Ok(decomposition)
    }

    // The distinct vertices of the given faces.
    fn face_vertices(&mut self, faces: &[EdgeId]) -> Vec<Point<Real>> {
        self.vertex_mark += 1;
        let mut points = Vec::new();

        for face in faces {
            for e in self.mesh.face_loop(*face) {
                let vid = self.mesh.edge(e).vertex as usize;
                if self.vertex_marks[vid] != self.vertex_mark {
                    self.vertex_marks[vid] = self.vertex_mark;
                    points.push(self.mesh.vertices()[vid]);
                }
            }
        }

        points
    }
}

#[cfg(test)]
mod test {
    use super::{Hacd, HacdState};
    use crate::math::Point;
    use crate::transformation::hacd::{
        HacdError, HacdParameters, NoProgress, PairProxy, SerialRunner,
    };
    use crate::transformation::half_edge::HalfEdgeMesh;

    // A unit cube made of 12 triangles.
    fn cube() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::with_vertices(vec![
            Point::new(-0.5, -0.5, -0.5),
            Point::new(0.5, -0.5, -0.5),
            Point::new(0.5, 0.5, -0.5),
            Point::new(-0.5, 0.5, -0.5),
            Point::new(-0.5, -0.5, 0.5),
            Point::new(0.5, -0.5, 0.5),
            Point::new(0.5, 0.5, 0.5),
            Point::new(-0.5, 0.5, 0.5),
        ]);
        mesh.begin_face();
        for quad in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ] {
            let _ = mesh.add_face(&[quad[0], quad[1], quad[2]], None).unwrap();
            let _ = mesh.add_face(&[quad[0], quad[2], quad[3]], None).unwrap();
        }
        mesh.end_face();
        mesh
    }

    #[test]
    fn state_transitions() {
        let mesh = cube();
        let params = HacdParameters::default();
        let mut hacd = Hacd::new(&mesh, &params, &mut NoProgress).unwrap();

        assert_eq!(hacd.state(), HacdState::Initialized);
        // Coplanar triangles were merged into the 6 faces of the cube.
        assert_eq!(hacd.graph().num_clusters(), 6);
        assert_eq!(
            hacd.collapse_step(&SerialRunner, &mut NoProgress),
            Err(HacdError::InvalidState {
                expected: HacdState::Merging,
                found: HacdState::Initialized
            })
        );
        assert!(hacd.finalize(&mut NoProgress).is_err());

        hacd.submit_initial_edge_costs(&SerialRunner, &mut NoProgress)
            .unwrap();
        assert_eq!(hacd.state(), HacdState::Merging);
        // 12 edges between the faces of a cube.
        assert_eq!(hacd.num_pending_pairs(), 12);
        assert!(hacd
            .submit_initial_edge_costs(&SerialRunner, &mut NoProgress)
            .is_err());

        hacd.collapse_clusters(&SerialRunner, &mut NoProgress)
            .unwrap();
        assert_eq!(hacd.graph().num_clusters(), 1);
        assert_eq!(hacd.num_merges(), 5);

        let decomposition = hacd.finalize(&mut NoProgress).unwrap();
        assert_eq!(decomposition.num_hulls(), 1);
        assert_eq!(hacd.state(), HacdState::Finalized);
        assert_eq!(
            hacd.finalize(&mut NoProgress),
            Err(HacdError::AlreadyFinalized)
        );
    }

    #[test]
    fn empty_mesh() {
        let mesh = HalfEdgeMesh::new();
        assert_eq!(
            Hacd::new(&mesh, &HacdParameters::default(), &mut NoProgress).err(),
            Some(HacdError::EmptyGraph)
        );
    }

    #[test]
    fn popped_valid_pairs_reference_live_clusters() {
        let mesh = cube();
        let mut hacd = Hacd::new(&mesh, &HacdParameters::default(), &mut NoProgress).unwrap();
        hacd.submit_initial_edge_costs(&SerialRunner, &mut NoProgress)
            .unwrap();

        for _ in 0..3 {
            assert!(hacd.collapse_step(&SerialRunner, &mut NoProgress).unwrap());
        }
        assert_eq!(hacd.graph().num_clusters(), 3);
        let num_pairs = hacd
            .graph()
            .nodes()
            .map(|(id, node)| node.edges.iter().filter(|e| e.neighbor > id).count())
            .sum::<usize>();

        let mut num_valid = 0;
        while let Some((_, proxy)) = hacd.heap.pop() {
            if let PairProxy::Valid { node_a, node_b, .. } = proxy {
                assert!(hacd.graph().node(node_a).is_some());
                assert!(hacd.graph().node(node_b).is_some());
                num_valid += 1;
            }
        }

        // Exactly one live candidate per pair of adjacent clusters.
        assert!(num_pairs >= 2);
        assert_eq!(num_valid, num_pairs);
    }

    #[test]
    fn progress_phases() {
        let mesh = cube();
        let mut phases: Vec<String> = Vec::new();
        let mut fractions = Vec::new();
        let mut progress = |phase: &str, fraction: f64| {
            if phases.last().map(|p| p != phase).unwrap_or(true) {
                phases.push(phase.to_string());
            }
            fractions.push(fraction);
        };

        let _ = crate::transformation::hacd::convex_decomposition(
            &mesh,
            &HacdParameters::default(),
            &mut progress,
            &SerialRunner,
        )
        .unwrap();

        assert_eq!(
            phases,
            vec![
                "Making a copy of the input mesh",
                "Creating Connectivity Graph",
                "Submit Initial Edge Costs",
                "Collapse Clusters",
                "Creating Partition Mesh",
            ]
        );
        assert!(fractions.iter().all(|f| *f >= 0.0 && *f <= 1.0));
    }
}
