use crate::bounding_volume::Aabb;
use crate::math::Real;

/// The maximum number of primitives referenced by a single leaf.
pub const LEAF_CAPACITY: usize = 4;

/// The parent index of the root node.
pub(super) const NO_PARENT: u32 = u32::MAX;

/// The content of a BVH node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum BvhNodeKind {
    /// A leaf referencing the primitives `primitive_indices[first..=last]`.
    Leaf {
        /// Index of the first primitive index of this leaf.
        first: u32,
        /// Index of the last primitive index of this leaf (inclusive).
        last: u32,
    },
    /// An internal node with two children.
    Internal {
        /// Index of the left child.
        left: u32,
        /// Index of the right child.
        right: u32,
    },
}

/// A node of the [`Bvh`].
///
/// Its AABB bounds every primitive of its subtree.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhNode {
    /// The AABB of this node.
    pub aabb: Aabb,
    /// The leaf range, or the children, of this node.
    pub kind: BvhNodeKind,
    /// The index of the parent of this node, `u32::MAX` for the root.
    pub parent: u32,
}

impl BvhNode {
    /// Is this node a leaf?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, BvhNodeKind::Leaf { .. })
    }

    /// The children of this node if it is internal.
    #[inline]
    pub fn children(&self) -> Option<[u32; 2]> {
        match self.kind {
            BvhNodeKind::Internal { left, right } => Some([left, right]),
            BvhNodeKind::Leaf { .. } => None,
        }
    }
}

/// A static binary bounding volume hierarchy.
///
/// Primitives are identified by their index in the slice of AABBs the tree was built from.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bvh {
    pub(super) nodes: Vec<BvhNode>,
    pub(super) primitive_indices: Vec<u32>,
}

impl Bvh {
    /// An empty BVH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Is this tree empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The nodes of this tree. The root, if any, is the node 0.
    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The primitive indices referenced by the leaf ranges.
    #[inline]
    pub fn primitive_indices(&self) -> &[u32] {
        &self.primitive_indices
    }

    /// The primitives referenced by the given node if it is a leaf.
    #[inline]
    pub fn leaf_primitives(&self, node: &BvhNode) -> &[u32] {
        match node.kind {
            BvhNodeKind::Leaf { first, last } => {
                &self.primitive_indices[first as usize..=last as usize]
            }
            BvhNodeKind::Internal { .. } => &[],
        }
    }

    /// The AABB of the root of this tree, or an invalid AABB if it is empty.
    pub fn root_aabb(&self) -> Aabb {
        self.nodes
            .first()
            .map(|n| n.aabb)
            .unwrap_or_else(Aabb::new_invalid)
    }

    /// The number of leaves of this tree.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// The length of the longest root-to-leaf path, the root having depth 1.
    pub fn depth(&self) -> u32 {
        self.subtree_depth(0)
    }

    fn subtree_depth(&self, node_id: u32) -> u32 {
        match self.nodes.get(node_id as usize).map(|n| n.kind) {
            None => 0,
            Some(BvhNodeKind::Leaf { .. }) => 1,
            Some(BvhNodeKind::Internal { left, right }) => {
                1 + self.subtree_depth(left).max(self.subtree_depth(right))
            }
        }
    }

    /// The sum of the half-areas of every internal node.
    ///
    /// This is the cost reduced by [`Bvh::improve_fitness`].
    pub fn total_cost(&self) -> Real {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.aabb.half_area())
            .sum()
    }
}
