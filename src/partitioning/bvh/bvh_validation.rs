use super::bvh_tree::NO_PARENT;
use super::{Bvh, BvhNodeKind};
use crate::bounding_volume::{Aabb, BoundingVolume};

impl Bvh {
    /// Panics if this tree is not well-formed.
    ///
    /// Checks that parent links are consistent, that every node AABB contains the AABBs of
    /// its children, and that leaf ranges cover each primitive index exactly once.
    pub fn assert_well_formed(&self) {
        if self.is_empty() {
            assert!(self.primitive_indices.is_empty());
            return;
        }

        assert_eq!(self.nodes[0].parent, NO_PARENT, "The root must not have a parent.");

        let mut covered = vec![false; self.primitive_indices.len()];
        let mut visited = vec![false; self.nodes.len()];
        self.assert_well_formed_recurse(0, &mut covered, &mut visited);

        assert!(covered.iter().all(|c| *c), "Some primitives are not in any leaf.");
        assert!(visited.iter().all(|v| *v), "Some nodes are unreachable.");
    }

    /// Panics if the leaf containing each primitive does not bound `leaves[primitive]`.
    pub fn assert_leaves_contain(&self, leaves: &[Aabb]) {
        for node in self.nodes.iter().filter(|n| n.is_leaf()) {
            for primitive in self.leaf_primitives(node) {
                assert!(
                    node.aabb.contains(&leaves[*primitive as usize]),
                    "Leaf {:?} does not contain primitive {}: {:?}",
                    node.aabb,
                    primitive,
                    leaves[*primitive as usize]
                );
            }
        }
    }

    fn assert_well_formed_recurse(&self, id: u32, covered: &mut [bool], visited: &mut [bool]) {
        assert!(!visited[id as usize], "Loop detected at node {}.", id);
        visited[id as usize] = true;

        let node = &self.nodes[id as usize];

        match node.kind {
            BvhNodeKind::Leaf { first, last } => {
                assert!(first <= last);
                for k in first..=last {
                    assert!(!covered[k as usize], "Overlapping leaf ranges.");
                    covered[k as usize] = true;
                }
            }
            BvhNodeKind::Internal { left, right } => {
                for child in [left, right] {
                    let child_node = &self.nodes[child as usize];
                    assert_eq!(child_node.parent, id, "Invalid parent link.");
                    assert!(
                        node.aabb.contains(&child_node.aabb),
                        "Node {} does not contain its child {}.",
                        id,
                        child
                    );
                    self.assert_well_formed_recurse(child, covered, visited);
                }
            }
        }
    }
}
