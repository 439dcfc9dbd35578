use crate::math::Real;
use crate::transformation::half_edge::EdgeId;
use core::cmp::Ordering;
use ordered_float::OrderedFloat;
use alloc::collections::BinaryHeap;

/// Parents whose concavity exceeds the concavity of both children by less than this value
/// absorb their children.
const ABSORPTION_TOLERANCE: Real = 1.0e-5;

/// A node of the merge history of the clusters.
///
/// Leaves own face lists. Internal nodes join two subtrees at the concavity measured when
/// their clusters were merged.
#[derive(Clone, Debug, PartialEq)]
pub struct LookAheadNode {
    /// The concavity of the union of the faces below this node.
    pub concavity: Real,
    /// The faces of a leaf, empty for internal nodes.
    pub faces: Vec<EdgeId>,
    /// The two subtrees of an internal node.
    pub children: Option<[u32; 2]>,
    /// The number of faces below this node.
    pub num_faces: usize,
}

/// An arena of [`LookAheadNode`]s.
///
/// Nodes are never modified once added, except when a new parent absorbs them.
#[derive(Clone, Debug, Default)]
pub struct LookAheadTree {
    nodes: Vec<LookAheadNode>,
}

// Max-heap entry ordered by concavity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct WorstNode {
    concavity: OrderedFloat<Real>,
    node: u32,
}

impl PartialOrd for WorstNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorstNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.concavity
            .cmp(&other.concavity)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl LookAheadTree {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node with the given index.
    #[inline]
    pub fn node(&self, id: u32) -> &LookAheadNode {
        &self.nodes[id as usize]
    }

    /// The number of nodes of the arena, including absorbed ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is this arena empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a leaf for a single face.
    pub fn add_leaf(&mut self, face: EdgeId, concavity: Real) -> u32 {
        self.nodes.push(LookAheadNode {
            concavity,
            faces: vec![face],
            children: None,
            num_faces: 1,
        });
        self.nodes.len() as u32 - 1
    }

    /// Adds a node joining the subtrees `left` and `right` at `concavity`.
    ///
    /// The new node is a leaf owning the faces of both subtrees if one of them is a single
    /// face, or if they are not significantly less concave than their union.
    pub fn join(&mut self, left: u32, right: u32, concavity: Real) -> u32 {
        let (l, r) = (&self.nodes[left as usize], &self.nodes[right as usize]);
        let num_faces = l.num_faces + r.num_faces;
        let test = concavity - ABSORPTION_TOLERANCE;
        let absorb =
            l.num_faces == 1 || r.num_faces == 1 || (test <= l.concavity && test <= r.concavity);

        let node = if absorb {
            let mut faces = self.take_faces(left);
            faces.append(&mut self.take_faces(right));
            LookAheadNode {
                concavity,
                faces,
                children: None,
                num_faces,
            }
        } else {
            LookAheadNode {
                concavity,
                faces: Vec::new(),
                children: Some([left, right]),
                num_faces,
            }
        };

        self.nodes.push(node);
        self.nodes.len() as u32 - 1
    }

    // Moves out all the faces below `node`.
    fn take_faces(&mut self, node: u32) -> Vec<EdgeId> {
        let mut faces = Vec::with_capacity(self.nodes[node as usize].num_faces);
        let mut stack = vec![node];

        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id as usize];
            faces.append(&mut node.faces);
            if let Some([left, right]) = node.children {
                stack.push(right);
                stack.push(left);
            }
        }

        faces
    }

    /// All the faces below `node`.
    pub fn faces(&self, node: u32) -> Vec<EdgeId> {
        let mut faces = Vec::with_capacity(self.nodes[node as usize].num_faces);
        let mut stack = vec![node];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            faces.extend_from_slice(&node.faces);
            if let Some([left, right]) = node.children {
                stack.push(right);
                stack.push(left);
            }
        }

        faces
    }

    /// Cuts the tree rooted at `root` into at most `max_count` subtrees.
    ///
    /// The most concave subtree is repeatedly replaced by its two children until
    /// `max_count` subtrees are reached, or the worst concavity among the subtrees that
    /// can still be split is at most `max_concavity`. The subtrees are returned from the
    /// most to the least concave.
    pub fn reduce(&self, root: u32, max_count: usize, max_concavity: Real) -> Vec<u32> {
        let max_count = max_count.max(1);
        let mut heap = BinaryHeap::with_capacity(max_count * 2);
        heap.push(WorstNode {
            concavity: OrderedFloat(self.node(root).concavity),
            node: root,
        });

        // Leaves are pushed back with a negative concavity once they become the worst.
        while heap.len() < max_count {
            let Some(worst) = heap.peek().copied() else {
                break;
            };
            if worst.concavity.0 < 0.0 || worst.concavity.0 <= max_concavity {
                break;
            }

            let _ = heap.pop();
            match self.node(worst.node).children {
                Some([left, right]) => {
                    for child in [left, right] {
                        heap.push(WorstNode {
                            concavity: OrderedFloat(self.node(child).concavity),
                            node: child,
                        });
                    }
                }
                None => heap.push(WorstNode {
                    concavity: OrderedFloat(-1.0),
                    node: worst.node,
                }),
            }
        }

        let mut result = Vec::with_capacity(heap.len());
        while let Some(entry) = heap.pop() {
            result.push(entry.node);
        }
        result
    }
}
