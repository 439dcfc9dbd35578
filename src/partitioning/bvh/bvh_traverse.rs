use super::{BvhNode, BvhNodeKind};
use crate::partitioning::Bvh;
use smallvec::SmallVec;

const TRAVERSAL_STACK_SIZE: usize = 32;

/// Iterator over the primitives of a [`Bvh`] contained by leaves passing a predicate.
///
/// Internal nodes failing the predicate are pruned along with their subtree.
pub struct Leaves<'a, Check: Fn(&BvhNode) -> bool> {
    tree: &'a Bvh,
    pending: &'a [u32],
    stack: SmallVec<[&'a BvhNode; TRAVERSAL_STACK_SIZE]>,
    check: Check,
}

impl<'a, Check: Fn(&BvhNode) -> bool> Leaves<'a, Check> {
    /// Creates a new iterator over the primitives of `tree` filtered by `check`.
    pub fn new(tree: &'a Bvh, check: Check) -> Leaves<'a, Check> {
        let mut stack = SmallVec::default();

        if let Some(root) = tree.nodes.first() {
            if check(root) {
                stack.push(root);
            }
        }

        Leaves {
            tree,
            pending: &[],
            stack,
            check,
        }
    }
}

impl<Check: Fn(&BvhNode) -> bool> Iterator for Leaves<'_, Check> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;

        loop {
            if let Some((first, rest)) = self.pending.split_first() {
                self.pending = rest;
                return Some(*first);
            }

            let node = self.stack.pop()?;

            match node.kind {
                BvhNodeKind::Leaf { .. } => self.pending = tree.leaf_primitives(node),
                BvhNodeKind::Internal { left, right } => {
                    for child in [right, left] {
                        let child = &tree.nodes[child as usize];
                        if (self.check)(child) {
                            self.stack.push(child);
                        }
                    }
                }
            }
        }
    }
}

/// Controls the execution flow of [`Bvh::traverse`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalAction {
    /// The traversal will continue on the children of the tested node.
    Continue,
    /// The traversal will skip all descendants of the tested node.
    Prune,
    /// The traversal will exit immediately.
    EarlyExit,
}

impl Bvh {
    /// Iterates through the primitives of every leaf such that the leaf and all its
    /// ancestors pass `check_node`.
    pub fn leaves<F: Fn(&BvhNode) -> bool>(&self, check_node: F) -> Leaves<'_, F> {
        Leaves::new(self, check_node)
    }

    #[inline(always)]
    pub(super) fn traversal_stack() -> SmallVec<[u32; TRAVERSAL_STACK_SIZE]> {
        Default::default()
    }

    /// Traverses the tree in depth-first order, left child first.
    ///
    /// The closure decides, for every visited node, whether its subtree should be visited.
    pub fn traverse(&self, mut check_node: impl FnMut(&BvhNode) -> TraversalAction) {
        if self.nodes.is_empty() {
            return;
        }

        let mut stack = Self::traversal_stack();
        stack.push(0);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];

            match check_node(node) {
                TraversalAction::EarlyExit => return,
                TraversalAction::Prune => {}
                TraversalAction::Continue => {
                    if let Some([left, right]) = node.children() {
                        stack.push(right);
                        stack.push(left);
                    }
                }
            }
        }
    }
}
