use super::bvh_tree::NO_PARENT;
use super::{Bvh, BvhNodeKind};
use crate::bounding_volume::BoundingVolume;
use crate::math::Real;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Rotation {
    None,
    // Swap the left child of the node with its sibling.
    Left,
    // Swap the right child of the node with its sibling.
    Right,
}

impl Bvh {
    /// Improves the quality of this tree by rotating nodes with their parent.
    ///
    /// Every internal node whose sibling is bigger than one of its children trades that
    /// child with its sibling if this reduces its surface area. Passes are repeated until
    /// the total cost stops decreasing, with at most twice the tree depth passes.
    ///
    /// Returns the number of passes that reduced the cost.
    pub fn improve_fitness(&mut self) -> u32 {
        let max_passes = 2 * self.depth();
        let mut cost = self.total_cost();
        let mut improving_passes = 0;

        for _ in 0..max_passes {
            for node_id in 1..self.nodes.len() as u32 {
                self.improve_node_fitness(node_id);
            }

            let new_cost = self.total_cost();
            if new_cost >= cost {
                break;
            }

            log::trace!("BVH fitness pass: cost {} -> {}", cost, new_cost);
            cost = new_cost;
            improving_passes += 1;
        }

        improving_passes
    }

    fn improve_node_fitness(&mut self, node_id: u32) {
        let node = self.nodes[node_id as usize];
        let Some([left, right]) = node.children() else {
            return;
        };

        if node.parent == NO_PARENT {
            return;
        }

        let parent = node.parent;
        let Some([parent_left, parent_right]) = self.nodes[parent as usize].children() else {
            return;
        };
        let sibling = if parent_left == node_id {
            parent_right
        } else {
            parent_left
        };

        let left_aabb = self.nodes[left as usize].aabb;
        let right_aabb = self.nodes[right as usize].aabb;
        let sibling_aabb = self.nodes[sibling as usize].aabb;

        let candidates: [(Real, Rotation); 3] = [
            (node.aabb.half_area(), Rotation::None),
            (sibling_aabb.merged(&right_aabb).half_area(), Rotation::Left),
            (left_aabb.merged(&sibling_aabb).half_area(), Rotation::Right),
        ];

        let best = candidates
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|c| c.1)
            .unwrap_or(Rotation::None);

        // The parent AABB is unchanged: it still bounds the same three subtrees.
        let (moved_up, new_children) = match best {
            Rotation::None => return,
            Rotation::Left => (left, [sibling, right]),
            Rotation::Right => (right, [left, sibling]),
        };

        self.nodes[node_id as usize].kind = BvhNodeKind::Internal {
            left: new_children[0],
            right: new_children[1],
        };
        self.nodes[node_id as usize].aabb = self.nodes[new_children[0] as usize]
            .aabb
            .merged(&self.nodes[new_children[1] as usize].aabb);
        self.nodes[sibling as usize].parent = node_id;
        self.nodes[moved_up as usize].parent = parent;

        self.nodes[parent as usize].kind = if parent_left == node_id {
            BvhNodeKind::Internal {
                left: node_id,
                right: moved_up,
            }
        } else {
            BvhNodeKind::Internal {
                left: moved_up,
                right: node_id,
            }
        };
    }
}
